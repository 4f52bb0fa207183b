//! Unified error handling for the admin API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::storage::BlobStoreError;
use crate::storage::documents::DocumentStoreError;

/// Application-level error type for the admin API.
///
/// Every failure response is JSON of the form `{"error": "..."}` with a
/// status in {400, 404, 500}.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or oversized upload, bad request shape.
    #[error("{0}")]
    Validation(String),

    /// Upload of a type outside the allow-list.
    #[error("{0}")]
    UnsupportedFormat(String),

    /// Unknown id or orderId.
    #[error("{0}")]
    NotFound(String),

    /// Blob store I/O failed.
    #[error("Storage error: {0}")]
    Blob(#[from] BlobStoreError),

    /// Document store I/O failed.
    #[error("Storage error: {0}")]
    Document(#[from] DocumentStoreError),

    /// The multipart body could not be read.
    #[error("Invalid upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnsupportedFormat(_) | Self::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Blob(_) | Self::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Blob(_) | Self::Document(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Upstream store error"
            );
        }

        let status = self.status();

        // Don't expose provider details on server errors.
        let message = match &self {
            Self::Blob(_) | Self::Document(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
