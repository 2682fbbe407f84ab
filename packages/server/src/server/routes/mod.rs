// HTTP routes
pub mod health;
pub mod jobs;

pub use health::*;
pub use jobs::*;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::kernel::JobStoreError;

/// Response mapping for job-layer errors.
pub struct ApiError(pub JobStoreError);

impl From<JobStoreError> for ApiError {
    fn from(err: JobStoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            JobStoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            JobStoreError::NotFound(_) => StatusCode::NOT_FOUND,
            JobStoreError::NotReady(_)
            | JobStoreError::InvalidTransition { .. }
            | JobStoreError::NotOwner { .. } => StatusCode::CONFLICT,
            JobStoreError::Storage(_) | JobStoreError::Serde(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
