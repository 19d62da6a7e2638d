//! CRUD handlers shared by every stored resource kind.

use axum::{
    Json,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::IntoResponse,
};
use pkg_state::StoredResource;
use pkg_types::GlobalNetworkPolicy;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

/// 201 for the first write of a name, 200 for later ones.
pub(crate) fn upsert_status<R: StoredResource>(resource: &R) -> StatusCode {
    if resource.version() == 1 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

/// POST: create or update by name.
pub async fn upsert_resource<R: StoredResource + 'static>(
    State(state): State<AppState>,
    Json(resource): Json<R>,
) -> Result<impl IntoResponse, ApiError> {
    let stored = state.registry.upsert(resource).await?;
    info!(
        "Upserted {} {} (version {})",
        R::KIND,
        stored.name(),
        stored.version()
    );
    Ok((upsert_status(&stored), Json(stored)))
}

pub async fn list_resources<R: StoredResource + 'static>(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let resources = state.registry.list::<R>().await?;
    Ok((StatusCode::OK, Json(resources)))
}

pub async fn get_resource<R: StoredResource + 'static>(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = state.registry.get::<R>(&name).await?;
    Ok((StatusCode::OK, Json(resource)))
}

pub async fn delete_resource<R: StoredResource + 'static>(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.registry.delete::<R>(&name).await?;
    info!("Deleted {} {}", R::KIND, name);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/globalnetworkpolicies, in evaluation order.
pub async fn list_global_network_policies(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let policies: Vec<GlobalNetworkPolicy> =
        state.registry.list_global_network_policies().await?;
    Ok((StatusCode::OK, Json(policies)))
}
