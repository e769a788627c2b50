use anyhow::Result;

use crate::models::ImageUpload;

/// A vision-language model that can look at an image and answer an instruction.
///
/// One synchronous round trip per call; no streaming.
#[async_trait::async_trait]
pub trait VisionService: Send + Sync {
    /// Provider/model label for logs.
    fn describe(&self) -> String;

    async fn analyze_image(&self, image: &ImageUpload, instruction: &str) -> Result<String>;
}
