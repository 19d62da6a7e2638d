pub mod auth;
pub mod error;
pub mod handlers;
pub mod request_id;
pub mod server;

use pkg_state::Registry;

/// Shared application state injected into all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub token: String,
}
