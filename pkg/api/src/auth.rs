use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::AppState;

/// Middleware: Authenticates the request using a Bearer token.
/// Every protected route shares the single admin token from the server config.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == state.token {
        Ok(next.run(req).await)
    } else {
        warn!(
            "Invalid Bearer token for {} {}",
            req.method(),
            req.uri().path()
        );
        Err(StatusCode::UNAUTHORIZED)
    }
}
