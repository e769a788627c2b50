use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection, rejection::BytesRejection, DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::error::{ApiError, ScanError};
use crate::handlers::{ScanAnalyzer, ScanRecords};
use crate::models::{AnalysisResult, Co2Tier, ImageUpload, RecyclabilityTier, ScanRecord};

const IMAGE_FIELD: &str = "image";

pub struct AppState {
    pub analyzer: ScanAnalyzer,
    pub records: ScanRecords,
}

pub struct RouterOptions {
    pub max_upload_bytes: usize,
    pub static_dir: Option<PathBuf>,
}

/// Body of a successful analysis: the model-shaped result plus everything
/// derived from it.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub recyclability_tier: RecyclabilityTier,
    pub co2_tier: Co2Tier,
    pub scan_record: ScanRecord,
}

impl From<AnalysisResult> for AnalysisResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            recyclability_tier: result.recyclability_tier(),
            co2_tier: result.co2_tier(),
            scan_record: ScanRecord::from_analysis(&result),
            result,
        }
    }
}

pub fn create_router(state: Arc<AppState>, options: RouterOptions) -> Router {
    let router = Router::new()
        .route("/api/ai", post(analyze_handler))
        .route("/api/results", get(list_results_handler).post(save_result_handler))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .with_state(state);

    match options.static_dir {
        Some(dir) => {
            log::info!("🗂️ Serving static frontend from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        None => router.route("/", get(root_handler)),
    }
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    match run_analysis(&state, multipart).await {
        Ok(result) => Ok(Json(result.into())),
        Err(e) => {
            match &e {
                ScanError::InputMissing => log::warn!("⚠️ Analysis request without an image"),
                other => log::error!("❌ Error processing image: {}", other),
            }
            Err(ApiError::analysis(e))
        }
    }
}

async fn run_analysis(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<AnalysisResult, ScanError> {
    let multipart = multipart.map_err(|e| ScanError::UnreadableBody(e.body_text()))?;
    let image = read_image(multipart).await?;
    state.analyzer.analyze(&image).await
}

/// First non-empty `image` part of the form.
async fn read_image(mut multipart: Multipart) -> Result<ImageUpload, ScanError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ScanError::UnreadableBody(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ScanError::UnreadableBody(e.body_text()))?;

        if bytes.is_empty() {
            break;
        }

        return Ok(ImageUpload::new(bytes.to_vec(), content_type.as_deref(), file_name));
    }

    Err(ScanError::InputMissing)
}

async fn save_result_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = match body {
        Ok(bytes) => match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(document) => state.records.record(document).await,
            Err(source) => Err(ScanError::Parse {
                raw: String::from_utf8_lossy(&bytes).into_owned(),
                source,
            }),
        },
        Err(rejection) => Err(ScanError::UnreadableBody(rejection.body_text())),
    };

    match outcome {
        Ok(id) => Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({ "success": true, "id": id })),
        )),
        Err(e) => {
            log::error!("❌ Error saving scan result: {}", e);
            Err(ApiError::save(e))
        }
    }
}

async fn list_results_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    state.records.list().await.map(Json).map_err(|e| {
        log::error!("❌ Error retrieving scan results: {}", e);
        ApiError::list(e)
    })
}

async fn root_handler() -> &'static str {
    "Recycle Scanner API - POST /api/ai to analyze an image, /api/results to save or list scans"
}

async fn health_check() -> &'static str {
    "OK"
}
