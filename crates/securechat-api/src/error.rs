use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use securechat_stego::StegoError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Every failure a handler or core operation can report.
///
/// `NotFound` and `InvalidCode` stay distinct here so callers and tests can
/// tell them apart; on the wire both are a plain `success: false` body.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Message not found")]
    NotFound,

    #[error("Invalid decrypt code")]
    InvalidCode,

    #[error("Auto-delete feature not available")]
    FeatureUnavailable,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StegoError> for AppError {
    fn from(err: StegoError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidCode => StatusCode::FORBIDDEN,
            AppError::FeatureUnavailable => StatusCode::NOT_IMPLEMENTED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Internal(e) => {
                error!("Request failed: {:#}", e);
                "Server error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Run blocking store or image work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
