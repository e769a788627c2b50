use std::sync::Arc;
use std::time::Duration;

use crate::error::ScanError;
use crate::handlers::{extract, normalize, prompt};
use crate::models::{AnalysisResult, ImageUpload};
use crate::services::VisionService;

/// Image → vision model → extracted JSON → [`AnalysisResult`].
pub struct ScanAnalyzer {
    vision: Arc<dyn VisionService>,
    biotech_insights: bool,
    timeout: Duration,
}

impl ScanAnalyzer {
    pub fn new(vision: Arc<dyn VisionService>, biotech_insights: bool, timeout: Duration) -> Self {
        Self {
            vision,
            biotech_insights,
            timeout,
        }
    }

    pub async fn analyze(&self, image: &ImageUpload) -> Result<AnalysisResult, ScanError> {
        log::info!(
            "📸 Analyzing image {:?} ({} bytes, {}) with {}",
            image.file_name,
            image.bytes.len(),
            image.mime_type,
            self.vision.describe()
        );

        let instruction = format!(
            "{}\n\n{}",
            prompt::instruction(self.biotech_insights),
            prompt::ANALYZE_REQUEST
        );

        let reply = match tokio::time::timeout(self.timeout, self.vision.analyze_image(image, &instruction)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                log::error!("❌ Vision call failed: {:#}", e);
                return Err(ScanError::UpstreamCallFailure(format!("{:#}", e)));
            }
            Err(_) => {
                log::error!("⏱️ Vision call timed out after {:?}", self.timeout);
                return Err(ScanError::UpstreamCallFailure(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        log::debug!("📄 Raw model reply: {}", reply);

        let value = extract::extract_json(&reply).map_err(|e| {
            log::error!(
                "❌ Could not extract JSON ({}); raw reply: {}",
                e,
                e.raw_reply().unwrap_or_default()
            );
            e
        })?;

        let result = normalize::normalize(&value).map_err(|e| {
            log::error!("❌ Model reply did not match the result schema ({}): {}", e, value);
            e
        })?;

        log::info!(
            "✅ Detected '{}' ({}), score {} → {}, CO2 impact {}",
            result.detected_object,
            result.material,
            result.recyclability_score,
            result.recyclability_tier(),
            result.co2_tier()
        );

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Vision double replying with a fixed text (or failing).
    pub struct CannedVision {
        reply: Option<String>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        last_instruction: Mutex<Option<String>>,
    }

    impl CannedVision {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                delay: None,
                calls: AtomicUsize::new(0),
                last_instruction: Mutex::new(None),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: None,
                ..Self::replying("")
            }
        }

        pub fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::replying("{}")
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_instruction(&self) -> Option<String> {
            self.last_instruction.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl VisionService for CannedVision {
        fn describe(&self) -> String {
            "canned".to_string()
        }

        async fn analyze_image(&self, _image: &ImageUpload, instruction: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_instruction.lock().unwrap() = Some(instruction.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply
                .clone()
                .ok_or_else(|| anyhow::anyhow!("upstream unavailable"))
        }
    }

    pub const BOTTLE_REPLY: &str = "```json\n{\"detected_object\":\"plastic bottle\",\"recyclability_score\":85,\"recyclable\":true,\"material\":\"PET plastic\",\"recycling_statistics\":{\"global_recycling_rate\":\"29%\",\"common_issues\":[\"contamination\"],\"processing_notes\":\"rinse before disposal\"},\"recommendation\":\"rinse and place in recycling bin\"}\n```";
}

#[cfg(test)]
mod tests {
    use super::testing::{CannedVision, BOTTLE_REPLY};
    use super::*;
    use crate::models::{fixtures, RecyclabilityTier};

    fn image() -> ImageUpload {
        ImageUpload::new(vec![0xFF, 0xD8, 0xFF], None, Some("bottle.jpg".to_string()))
    }

    fn analyzer(vision: Arc<CannedVision>, biotech: bool) -> ScanAnalyzer {
        ScanAnalyzer::new(vision, biotech, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_fenced_reply_is_normalized() {
        let vision = Arc::new(CannedVision::replying(BOTTLE_REPLY));
        let result = analyzer(vision.clone(), false).analyze(&image()).await.unwrap();

        assert_eq!(result, fixtures::plastic_bottle());
        assert_eq!(result.recyclability_tier(), RecyclabilityTier::HighlyRecyclable);
        assert_eq!(vision.calls(), 1);
    }

    #[tokio::test]
    async fn test_prompt_variant_follows_setting() {
        let vision = Arc::new(CannedVision::replying(BOTTLE_REPLY));
        analyzer(vision.clone(), true).analyze(&image()).await.unwrap();

        let instruction = vision.last_instruction().unwrap();
        assert!(instruction.contains("biotech_insights"));
        assert!(instruction.ends_with(prompt::ANALYZE_REQUEST));
    }

    #[tokio::test]
    async fn test_prose_reply_is_extraction_error() {
        let vision = Arc::new(CannedVision::replying("That looks like a bottle to me."));
        let err = analyzer(vision, false).analyze(&image()).await.unwrap_err();
        assert!(matches!(err, ScanError::Extraction { .. }));
    }

    #[tokio::test]
    async fn test_incomplete_object_is_normalization_error() {
        let vision = Arc::new(CannedVision::replying("{\"detected_object\": \"cup\"}"));
        let err = analyzer(vision, false).analyze(&image()).await.unwrap_err();
        assert!(matches!(err, ScanError::Normalization(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let vision = Arc::new(CannedVision::failing());
        let err = analyzer(vision, false).analyze(&image()).await.unwrap_err();
        match err {
            ScanError::UpstreamCallFailure(details) => assert!(details.contains("upstream unavailable")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let vision = Arc::new(CannedVision::slow(Duration::from_secs(5)));
        let analyzer = ScanAnalyzer::new(vision, false, Duration::from_millis(20));
        let err = analyzer.analyze(&image()).await.unwrap_err();
        match err {
            ScanError::UpstreamCallFailure(details) => assert!(details.contains("timed out")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
