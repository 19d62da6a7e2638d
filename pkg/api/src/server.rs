use axum::{
    Router, middleware,
    routing::{get, post},
};
use pkg_state::{Registry, StateStore};
use pkg_types::{GlobalNetworkPolicy, GlobalNetworkSet, HostEndpoint};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::AppState;
use crate::auth::auth_middleware;
use crate::handlers::{hostendpoints, resources, selectors, system};
use crate::request_id::request_id_middleware;

/// Server configuration passed from the binary's CLI.
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub data_dir: String,
    pub token: String,
}

/// Assemble the full router for `state`.
pub fn build_router(state: AppState) -> Router {
    // Protected API routes
    let api_routes = Router::new()
        // Host endpoints
        .route(
            "/api/v1/hostendpoints",
            post(hostendpoints::upsert_host_endpoint).get(resources::list_resources::<HostEndpoint>),
        )
        .route(
            "/api/v1/hostendpoints/policies",
            get(hostendpoints::fetch_all_policies),
        )
        .route(
            "/api/v1/hostendpoints/by-address",
            get(hostendpoints::get_host_endpoint_by_address)
                .delete(hostendpoints::delete_host_endpoint_by_address),
        )
        .route(
            "/api/v1/hostendpoints/{name}",
            get(resources::get_resource::<HostEndpoint>)
                .delete(resources::delete_resource::<HostEndpoint>),
        )
        .route(
            "/api/v1/hostendpoints/{name}/policies",
            get(hostendpoints::fetch_policies),
        )
        // Global network policies
        .route(
            "/api/v1/globalnetworkpolicies",
            post(resources::upsert_resource::<GlobalNetworkPolicy>)
                .get(resources::list_global_network_policies),
        )
        .route(
            "/api/v1/globalnetworkpolicies/{name}",
            get(resources::get_resource::<GlobalNetworkPolicy>)
                .delete(resources::delete_resource::<GlobalNetworkPolicy>),
        )
        // Global network sets
        .route(
            "/api/v1/globalnetworksets",
            post(resources::upsert_resource::<GlobalNetworkSet>)
                .get(resources::list_resources::<GlobalNetworkSet>),
        )
        .route(
            "/api/v1/globalnetworksets/{name}",
            get(resources::get_resource::<GlobalNetworkSet>)
                .delete(resources::delete_resource::<GlobalNetworkSet>),
        )
        // Selectors
        .route(
            "/api/v1/selectors/validate",
            post(selectors::validate_selector),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes + merged
    Router::new()
        .route("/api/v1/ping", get(system::ping))
        .merge(api_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let store = StateStore::new(&config.data_dir).await?;

    let state = AppState {
        registry: Registry::new(store.clone()),
        token: config.token,
    };
    let app = build_router(state);

    info!("Starting API server on {}", config.addr);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await?;
    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
