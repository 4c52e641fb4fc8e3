use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use invoker_core::InvokerError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Invocation(#[from] InvokerError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Invocation(InvokerError::LlmProvider(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Invocation(InvokerError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Invocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
