use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Every way a scan can fail between the HTTP boundary and the collaborators.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("No image file provided")]
    InputMissing,

    #[error("Failed to read request body: {0}")]
    UnreadableBody(String),

    #[error("Vision service call failed: {0}")]
    UpstreamCallFailure(String),

    #[error("no JSON block found")]
    Extraction { raw: String },

    #[error("malformed JSON: {source}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing or invalid field '{0}'")]
    Normalization(String),

    #[error("Failed to connect to database: {0}")]
    StoreConnect(String),

    #[error("Database operation failed: {0}")]
    StoreOperation(String),

    #[error("Invalid scan record: {0}")]
    InvalidRecord(String),
}

impl ScanError {
    /// Raw model reply attached to extraction and parse failures.
    pub fn raw_reply(&self) -> Option<&str> {
        match self {
            ScanError::Extraction { raw } | ScanError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ScanError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_) => ScanError::StoreConnect(err.to_string()),
            _ => ScanError::StoreOperation(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Uniform `{error, details}` response produced at the endpoint boundary.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    details: Option<String>,
}

impl ApiError {
    pub fn analysis(err: ScanError) -> Self {
        match err {
            ScanError::InputMissing => Self {
                status: StatusCode::BAD_REQUEST,
                error: "No image file provided",
                details: None,
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: "Failed to analyze image",
                details: Some(other.to_string()),
            },
        }
    }

    pub fn save(err: ScanError) -> Self {
        let status = match err {
            ScanError::InvalidRecord(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            error: "Failed to save scan result",
            details: Some(err.to_string()),
        }
    }

    pub fn list(err: ScanError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Failed to retrieve scan results",
            details: Some(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error.to_string(),
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}
