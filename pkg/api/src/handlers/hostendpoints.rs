use axum::{
    Json,
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use pkg_constants::policy::DEFAULT_TENANT_ID;
use pkg_resolver::{Resolution, ResolutionWarning};
use pkg_types::{HostEndpoint, HostEndpointPolicy};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;
use crate::handlers::resources::upsert_status;

/// Query parameters identifying a host endpoint by address.
#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    #[serde(default)]
    pub tenant_id: Option<u64>,
    pub ip: String,
}

impl AddressQuery {
    fn parse(&self) -> Result<(u64, IpAddr), ApiError> {
        let ip = self
            .ip
            .parse::<IpAddr>()
            .map_err(|_| ApiError::bad_request(format!("invalid ip '{}'", self.ip)))?;
        Ok((self.tenant_id.unwrap_or(DEFAULT_TENANT_ID), ip))
    }
}

/// Resolved policies for one host endpoint, plus any selectors skipped
/// while resolving them.
#[derive(Debug, Serialize)]
pub struct FetchPoliciesResponse {
    #[serde(flatten)]
    pub policy: HostEndpointPolicy,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ResolutionWarning>,
}

impl From<Resolution> for FetchPoliciesResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            policy: resolution.policy,
            warnings: resolution.warnings,
        }
    }
}

/// POST /api/v1/hostendpoints
pub async fn upsert_host_endpoint(
    State(state): State<AppState>,
    Json(hep): Json<HostEndpoint>,
) -> Result<impl IntoResponse, ApiError> {
    let stored = state.registry.upsert_host_endpoint(hep).await?;
    info!(
        "Upserted HostEndpoint {} (tenant={}, ip={}, version={})",
        stored.metadata.name,
        stored.spec.tenant_id,
        stored.primary_ip(),
        stored.version
    );
    Ok((upsert_status(&stored), Json(stored)))
}

/// GET /api/v1/hostendpoints/by-address?tenant_id=&ip=
pub async fn get_host_endpoint_by_address(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (tenant_id, ip) = query.parse()?;
    match state
        .registry
        .find_host_endpoint_by_address(tenant_id, ip)
        .await?
    {
        Some(hep) => Ok((StatusCode::OK, Json(hep)).into_response()),
        None => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("no host endpoint with ip {} in tenant {}", ip, tenant_id),
        }),
    }
}

/// DELETE /api/v1/hostendpoints/by-address?tenant_id=&ip=
pub async fn delete_host_endpoint_by_address(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (tenant_id, ip) = query.parse()?;
    let deleted = state
        .registry
        .delete_host_endpoint_by_address(tenant_id, ip)
        .await?;
    info!(
        "Deleted HostEndpoint {} by address {}/{}",
        deleted.metadata.name, tenant_id, ip
    );
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/hostendpoints/{name}/policies
pub async fn fetch_policies(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Skipped selectors were already logged by the resolver.
    let resolution = pkg_resolver::fetch_policies(&state.registry, &name).await?;
    Ok((StatusCode::OK, Json(FetchPoliciesResponse::from(resolution))))
}

/// GET /api/v1/hostendpoints/policies: every endpoint's bundle.
pub async fn fetch_all_policies(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let resolutions = pkg_resolver::fetch_all_policies(&state.registry).await?;
    let body: Vec<FetchPoliciesResponse> = resolutions
        .into_iter()
        .map(FetchPoliciesResponse::from)
        .collect();
    Ok((StatusCode::OK, Json(body)))
}
