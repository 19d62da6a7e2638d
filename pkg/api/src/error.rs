use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pkg_resolver::ResolveError;
use pkg_state::RegistryError;
use serde_json::json;
use tracing::warn;

/// Error returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let status = match &err {
            RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
            RegistryError::Invalid { .. } => StatusCode::BAD_REQUEST,
            RegistryError::Conflict(_) => StatusCode::CONFLICT,
            RegistryError::Serialization { .. } | RegistryError::Storage(_) => {
                warn!("Registry failure: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        let status = match &err {
            ResolveError::HostEndpointNotFound { .. } => StatusCode::NOT_FOUND,
            ResolveError::Storage(_) => {
                warn!("Policy fetch failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
