use async_trait::async_trait;
use pkg_types::{GlobalNetworkPolicy, GlobalNetworkSet, HostEndpoint};
use tracing::info;

use crate::error::ResolveError;
use crate::resolve::{Catalog, Resolution, Resolver};

/// Read access to the stored resources.
///
/// The three list calls are independent reads. A write landing between them
/// can yield a slightly mixed snapshot; the next fetch picks up the change.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn list_host_endpoints(&self) -> anyhow::Result<Vec<HostEndpoint>>;

    /// Policies in ascending effective order.
    async fn list_global_network_policies(&self) -> anyhow::Result<Vec<GlobalNetworkPolicy>>;

    async fn list_global_network_sets(&self) -> anyhow::Result<Vec<GlobalNetworkSet>>;

    async fn get_host_endpoint(&self, name: &str) -> anyhow::Result<Option<HostEndpoint>>;
}

/// Read the full catalog.
pub async fn read_catalog<R: CatalogReader + ?Sized>(reader: &R) -> Result<Catalog, ResolveError> {
    Ok(Catalog {
        host_endpoints: reader.list_host_endpoints().await?,
        policies: reader.list_global_network_policies().await?,
        network_sets: reader.list_global_network_sets().await?,
    })
}

/// Resolve the policy bundle of the host endpoint called `name`.
pub async fn fetch_policies<R: CatalogReader + ?Sized>(
    reader: &R,
    name: &str,
) -> Result<Resolution, ResolveError> {
    let target = reader
        .get_host_endpoint(name)
        .await?
        .ok_or_else(|| ResolveError::HostEndpointNotFound {
            name: name.to_string(),
        })?;
    let catalog = read_catalog(reader).await?;
    let resolution = Resolver::new(&catalog).resolve(&target);
    info!(
        "Fetched policies for host endpoint {} ({} policies, {} warnings)",
        name,
        resolution.policy.parsed_gnps.len(),
        resolution.warnings.len()
    );
    Ok(resolution)
}

/// Resolve every host endpoint against one catalog snapshot.
pub async fn fetch_all_policies<R: CatalogReader + ?Sized>(
    reader: &R,
) -> Result<Vec<Resolution>, ResolveError> {
    let catalog = read_catalog(reader).await?;
    let resolutions = Resolver::new(&catalog).resolve_all();
    info!("Fetched policies for {} host endpoints", resolutions.len());
    Ok(resolutions)
}
