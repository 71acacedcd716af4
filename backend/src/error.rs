use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::models::UnknownSemester;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Saved {written} of {total} writes before failing: {source}")]
    PartialSave {
        written: usize,
        total: usize,
        #[source]
        source: StoreError,
    },

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),
}

impl From<UnknownSemester> for AppError {
    fn from(err: UnknownSemester) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(e) => {
                error!("document store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Document store error occurred".to_string(),
                )
            }
            AppError::PartialSave { written, total, source } => {
                error!("save aborted after {}/{} writes: {}", written, total, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error saving courses. Please try again.".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
