//! HTTP-facing error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::profile::ProfileError;

const UNAVAILABLE: &str = "The service is temporarily unavailable. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("You are not logged in. Please log in again.")]
    Unauthorized,

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Profile(err) => match err {
                ProfileError::Validation(_) => StatusCode::BAD_REQUEST,
                ProfileError::NotFound => StatusCode::NOT_FOUND,
                ProfileError::Forbidden => StatusCode::FORBIDDEN,
                ProfileError::Conflict => StatusCode::CONFLICT,
                ProfileError::Database(_) | ProfileError::Cache(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Dependency details stay in the logs
        let message = if status == StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self, "request failed on a dependency");
            UNAVAILABLE.to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
