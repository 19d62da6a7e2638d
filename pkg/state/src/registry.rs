use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pkg_constants::state::{
    GLOBAL_NETWORK_POLICY_PREFIX, GLOBAL_NETWORK_SET_PREFIX, HOST_ENDPOINT_PREFIX,
};
use pkg_resolver::CatalogReader;
use pkg_types::validate::{
    validate_global_network_policy, validate_global_network_set, validate_host_endpoint,
};
use pkg_types::{
    GlobalNetworkPolicy, GlobalNetworkSet, HostEndpoint, ResourceKind, ValidationErrors,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::StateStore;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: ResourceKind, name: String },

    #[error("invalid {kind}: {source}")]
    Invalid {
        kind: ResourceKind,
        #[source]
        source: ValidationErrors,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("failed to decode {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// A resource kind the registry can persist.
pub trait StoredResource: Serialize + DeserializeOwned + Send + Sync {
    const KIND: ResourceKind;
    const PREFIX: &'static str;

    fn name(&self) -> &str;
    fn uuid(&self) -> &str;
    fn version(&self) -> u64;
    fn created_at(&self) -> DateTime<Utc>;
    fn stamp(&mut self, uuid: String, version: u64, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);

    /// Write-path checks run before anything is stored.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Fill fields computed from user input (address families and the like).
    fn derive(&mut self) {}

    fn key(name: &str) -> String {
        format!("{}{}", Self::PREFIX, name)
    }
}

impl StoredResource for HostEndpoint {
    const KIND: ResourceKind = ResourceKind::HostEndpoint;
    const PREFIX: &'static str = HOST_ENDPOINT_PREFIX;

    fn name(&self) -> &str {
        &self.metadata.name
    }
    fn uuid(&self) -> &str {
        &self.uuid
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn stamp(&mut self, uuid: String, version: u64, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.uuid = uuid;
        self.version = version;
        self.created_at = created_at;
        self.updated_at = updated_at;
    }
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_host_endpoint(self)
    }
    fn derive(&mut self) {
        self.derive_addresses();
    }
}

impl StoredResource for GlobalNetworkPolicy {
    const KIND: ResourceKind = ResourceKind::GlobalNetworkPolicy;
    const PREFIX: &'static str = GLOBAL_NETWORK_POLICY_PREFIX;

    fn name(&self) -> &str {
        &self.metadata.name
    }
    fn uuid(&self) -> &str {
        &self.uuid
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn stamp(&mut self, uuid: String, version: u64, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.uuid = uuid;
        self.version = version;
        self.created_at = created_at;
        self.updated_at = updated_at;
    }
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_global_network_policy(self)
    }
}

impl StoredResource for GlobalNetworkSet {
    const KIND: ResourceKind = ResourceKind::GlobalNetworkSet;
    const PREFIX: &'static str = GLOBAL_NETWORK_SET_PREFIX;

    fn name(&self) -> &str {
        &self.metadata.name
    }
    fn uuid(&self) -> &str {
        &self.uuid
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn stamp(&mut self, uuid: String, version: u64, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.uuid = uuid;
        self.version = version;
        self.created_at = created_at;
        self.updated_at = updated_at;
    }
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_global_network_set(self)
    }
    fn derive(&mut self) {
        self.derive_nets();
    }
}

/// Typed access to stored resources, keyed by name.
#[derive(Clone)]
pub struct Registry {
    store: StateStore,
    // Serializes read-modify-write cycles so versions never skip or repeat.
    write_lock: Arc<Mutex<()>>,
}

impl Registry {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create or replace the resource with this name.
    ///
    /// The first write assigns a UUID and version 1; later writes keep the
    /// UUID and creation time and bump the version.
    pub async fn upsert<R: StoredResource>(&self, resource: R) -> Result<R, RegistryError> {
        let resource = prepare(resource)?;
        let _guard = self.write_lock.lock().await;
        self.store_locked(resource).await
    }

    /// Stamp identity and version, then persist. Callers hold `write_lock`.
    async fn store_locked<R: StoredResource>(&self, mut resource: R) -> Result<R, RegistryError> {
        let key = R::key(resource.name());
        let now = Utc::now();
        let existing = self.find::<R>(resource.name()).await?;
        match existing {
            Some(existing) => resource.stamp(
                existing.uuid().to_string(),
                existing.version() + 1,
                existing.created_at(),
                now,
            ),
            None => resource.stamp(Uuid::new_v4().to_string(), 1, now, now),
        }

        self.store.put_json(&key, &resource).await?;
        info!(
            "Stored {} {} (uuid={}, version={})",
            R::KIND,
            resource.name(),
            resource.uuid(),
            resource.version()
        );
        Ok(resource)
    }

    pub async fn find<R: StoredResource>(&self, name: &str) -> Result<Option<R>, RegistryError> {
        let key = R::key(name);
        let data = self.store.get(&key).await?;
        match data {
            Some(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|source| RegistryError::Serialization { key, source }),
            None => Ok(None),
        }
    }

    pub async fn get<R: StoredResource>(&self, name: &str) -> Result<R, RegistryError> {
        self.find(name).await?.ok_or_else(|| RegistryError::NotFound {
            kind: R::KIND,
            name: name.to_string(),
        })
    }

    /// Every stored resource of kind `R`, in name order. Undecodable entries
    /// are skipped with a warning.
    pub async fn list<R: StoredResource>(&self) -> Result<Vec<R>, RegistryError> {
        let entries = self.store.list_prefix(R::PREFIX).await?;
        Ok(entries
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_slice(&value) {
                Ok(resource) => Some(resource),
                Err(e) => {
                    warn!("Skipping undecodable {} at {}: {}", R::KIND, key, e);
                    None
                }
            })
            .collect())
    }

    pub async fn delete<R: StoredResource>(&self, name: &str) -> Result<R, RegistryError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.get::<R>(name).await?;
        self.store.delete(&R::key(name)).await?;
        info!("Deleted {} {}", R::KIND, name);
        Ok(existing)
    }

    /// Policies in ascending effective order, ties broken by name.
    pub async fn list_global_network_policies(&self) -> Result<Vec<GlobalNetworkPolicy>, RegistryError> {
        let mut policies = self.list::<GlobalNetworkPolicy>().await?;
        policies.sort_by(|a, b| {
            a.effective_order()
                .cmp(&b.effective_order())
                .then_with(|| a.metadata.name.cmp(&b.metadata.name))
        });
        Ok(policies)
    }

    /// The host endpoint whose primary address is `ip` within `tenant_id`.
    pub async fn find_host_endpoint_by_address(
        &self,
        tenant_id: u64,
        ip: IpAddr,
    ) -> Result<Option<HostEndpoint>, RegistryError> {
        Ok(self
            .list::<HostEndpoint>()
            .await?
            .into_iter()
            .find(|hep| hep.spec.tenant_id == tenant_id && hep.spec.ip == Some(ip)))
    }

    pub async fn delete_host_endpoint_by_address(
        &self,
        tenant_id: u64,
        ip: IpAddr,
    ) -> Result<HostEndpoint, RegistryError> {
        let hep = self
            .find_host_endpoint_by_address(tenant_id, ip)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                kind: ResourceKind::HostEndpoint,
                name: format!("{}/{}", tenant_id, ip),
            })?;
        self.delete::<HostEndpoint>(&hep.metadata.name).await
    }

    /// Upsert a host endpoint, refusing to take over another endpoint's
    /// tenant and primary address. The address check and the write happen
    /// under the same lock.
    pub async fn upsert_host_endpoint(&self, hep: HostEndpoint) -> Result<HostEndpoint, RegistryError> {
        let hep = prepare(hep)?;
        let _guard = self.write_lock.lock().await;
        if let Some(ip) = hep.spec.ip {
            let holder = self
                .find_host_endpoint_by_address(hep.spec.tenant_id, ip)
                .await?;
            if let Some(other) = holder {
                if other.metadata.name != hep.metadata.name {
                    return Err(RegistryError::Conflict(format!(
                        "address {} in tenant {} is already used by host endpoint '{}'",
                        ip, hep.spec.tenant_id, other.metadata.name
                    )));
                }
            }
        }
        self.store_locked(hep).await
    }
}

/// Validate, then fill derived fields.
fn prepare<R: StoredResource>(mut resource: R) -> Result<R, RegistryError> {
    resource
        .validate()
        .map_err(|source| RegistryError::Invalid {
            kind: R::KIND,
            source,
        })?;
    resource.derive();
    Ok(resource)
}

#[async_trait]
impl CatalogReader for Registry {
    async fn list_host_endpoints(&self) -> anyhow::Result<Vec<HostEndpoint>> {
        Ok(self.list::<HostEndpoint>().await?)
    }

    async fn list_global_network_policies(&self) -> anyhow::Result<Vec<GlobalNetworkPolicy>> {
        Ok(Registry::list_global_network_policies(self).await?)
    }

    async fn list_global_network_sets(&self) -> anyhow::Result<Vec<GlobalNetworkSet>> {
        Ok(self.list::<GlobalNetworkSet>().await?)
    }

    async fn get_host_endpoint(&self, name: &str) -> anyhow::Result<Option<HostEndpoint>> {
        Ok(self.find::<HostEndpoint>(name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_types::{GnpRule, GnpSpec, GnsSpec, HostEndpointSpec, ResourceMetadata};

    async fn open_registry() -> (Registry, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("bfw-registry-{}", Uuid::new_v4()));
        let store = StateStore::new(dir.to_str().unwrap()).await.unwrap();
        (Registry::new(store), dir)
    }

    fn make_hep(name: &str, ip: &str) -> HostEndpoint {
        HostEndpoint {
            metadata: ResourceMetadata {
                name: name.to_string(),
                ..Default::default()
            },
            spec: HostEndpointSpec {
                ips: vec![ip.to_string()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn make_gnp(name: &str, order: Option<u64>) -> GlobalNetworkPolicy {
        GlobalNetworkPolicy {
            metadata: ResourceMetadata {
                name: name.to_string(),
                ..Default::default()
            },
            spec: GnpSpec {
                order,
                ingress: vec![GnpRule::default()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upsert_assigns_identity_then_bumps_version() {
        let (registry, dir) = open_registry().await;

        let first = registry.upsert(make_gnp("allow-all", Some(1))).await.unwrap();
        assert_eq!(first.version, 1);
        assert!(!first.uuid.is_empty());

        let second = registry.upsert(make_gnp("allow-all", Some(2))).await.unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(second.uuid, first.uuid);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let stored: GlobalNetworkPolicy = registry.get("allow-all").await.unwrap();
        assert_eq!(stored.spec.order, Some(2));
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn invalid_resources_never_reach_the_store() {
        let (registry, dir) = open_registry().await;
        let mut gnp = make_gnp("bad", None);
        gnp.spec.selector = "role ==".to_string();
        let err = registry.upsert(gnp).await.unwrap_err();
        assert!(matches!(err, RegistryError::Invalid { .. }));
        assert!(registry.find::<GlobalNetworkPolicy>("bad").await.unwrap().is_none());
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn policies_list_in_effective_order() {
        let (registry, dir) = open_registry().await;
        registry.upsert(make_gnp("a-last", None)).await.unwrap();
        registry.upsert(make_gnp("b-five", Some(5))).await.unwrap();
        registry.upsert(make_gnp("c-one", Some(1))).await.unwrap();
        registry.upsert(make_gnp("a-five", Some(5))).await.unwrap();
        let names: Vec<String> = registry
            .list_global_network_policies()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.metadata.name)
            .collect();
        assert_eq!(names, vec!["c-one", "a-five", "b-five", "a-last"]);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn network_sets_are_split_on_write() {
        let (registry, dir) = open_registry().await;
        let gns = GlobalNetworkSet {
            metadata: ResourceMetadata {
                name: "office".to_string(),
                ..Default::default()
            },
            spec: GnsSpec {
                nets: vec!["10.1.2.3".to_string(), "2001:db8::/48".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let stored = registry.upsert(gns).await.unwrap();
        assert_eq!(stored.spec.nets_v4, vec!["10.1.2.3/32"]);
        assert_eq!(stored.spec.nets_v6, vec!["2001:db8::/48"]);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn host_endpoints_by_address() {
        let (registry, dir) = open_registry().await;
        let stored = registry
            .upsert_host_endpoint(make_hep("web-1", "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(stored.spec.tenant_id, 1);

        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let found = registry.find_host_endpoint_by_address(1, ip).await.unwrap();
        assert_eq!(found.map(|h| h.metadata.name), Some("web-1".to_string()));
        assert!(registry.find_host_endpoint_by_address(2, ip).await.unwrap().is_none());

        let err = registry
            .upsert_host_endpoint(make_hep("web-2", "10.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict(_)));

        registry.delete_host_endpoint_by_address(1, ip).await.unwrap();
        let err = registry.get::<HostEndpoint>("web-1").await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_cannot_share_an_address() {
        let (registry, dir) = open_registry().await;
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        for round in 0..10 {
            let (a, b) = tokio::join!(
                registry.upsert_host_endpoint(make_hep(&format!("a-{}", round), "10.0.0.1")),
                registry.upsert_host_endpoint(make_hep(&format!("b-{}", round), "10.0.0.1")),
            );
            assert_eq!(
                a.is_ok() as u8 + b.is_ok() as u8,
                1,
                "exactly one create may win round {}",
                round
            );
            let holders = registry
                .list::<HostEndpoint>()
                .await
                .unwrap()
                .into_iter()
                .filter(|hep| hep.spec.ip == Some(ip))
                .count();
            assert_eq!(holders, 1);

            registry.delete_host_endpoint_by_address(1, ip).await.unwrap();
        }
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn registry_serves_as_catalog_reader() {
        let (registry, dir) = open_registry().await;
        registry
            .upsert_host_endpoint(make_hep("web-1", "10.0.0.1"))
            .await
            .unwrap();
        registry.upsert(make_gnp("p", Some(3))).await.unwrap();

        let resolution = pkg_resolver::fetch_policies(&registry, "web-1").await.unwrap();
        assert_eq!(resolution.policy.parsed_gnps.len(), 1);
        assert_eq!(resolution.policy.parsed_gnps[0].version, 1);

        let err = pkg_resolver::fetch_policies(&registry, "ghost").await.unwrap_err();
        assert!(err.is_not_found());
        std::fs::remove_dir_all(dir).ok();
    }
}
