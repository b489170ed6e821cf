use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        // Validation messages go back to the client verbatim; internal detail
        // stays in the server log only.
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!("request failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process chat query".to_string(),
                )
            }
        };

        let body = Json(json!({ "success": false, "error": message }));
        (status, body).into_response()
    }
}
