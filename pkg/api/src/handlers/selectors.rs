use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ValidateSelectorRequest {
    pub selector: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateSelectorResponse {
    pub selector: String,
    pub canonical: String,
}

/// POST /api/v1/selectors/validate: compile a selector and echo its
/// canonical form.
pub async fn validate_selector(
    Json(req): Json<ValidateSelectorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let selector = pkg_selector::parse(&req.selector)
        .map_err(|e| ApiError::bad_request(format!("invalid selector: {}", e)))?;
    Ok((
        StatusCode::OK,
        Json(ValidateSelectorResponse {
            canonical: selector.canonical().to_string(),
            selector: req.selector,
        }),
    ))
}
