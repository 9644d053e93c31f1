use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use huddle_core::HuddleError;
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Maps directory and relay failures onto status codes.
#[derive(Debug)]
pub struct ApiError(pub HuddleError);

impl ApiError {
    fn as_status_code(&self) -> StatusCode {
        match &self.0 {
            HuddleError::Unauthorized => StatusCode::UNAUTHORIZED,
            HuddleError::NotFound { .. } => StatusCode::NOT_FOUND,
            HuddleError::BadRequest(_) | HuddleError::Serialization(_) => StatusCode::BAD_REQUEST,
            HuddleError::RelayTimeout => StatusCode::GATEWAY_TIMEOUT,
            HuddleError::RelayUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            HuddleError::SessionExists(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<HuddleError> for ApiError {
    fn from(value: HuddleError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
