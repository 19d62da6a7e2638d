use anyhow::{Context, bail};
use pkg_types::validate::{
    validate_global_network_policy, validate_global_network_set, validate_host_endpoint,
};
use pkg_types::{GlobalNetworkPolicy, GlobalNetworkSet, HostEndpoint, ResourceKind};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

/// Resource type as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceType(pub ResourceKind);

impl ResourceType {
    /// Collection path under `/api/v1`.
    pub fn collection(self) -> &'static str {
        match self.0 {
            ResourceKind::HostEndpoint => "hostendpoints",
            ResourceKind::GlobalNetworkPolicy => "globalnetworkpolicies",
            ResourceKind::GlobalNetworkSet => "globalnetworksets",
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hostendpoint" | "hostendpoints" | "hep" => Ok(Self(ResourceKind::HostEndpoint)),
            "globalnetworkpolicy" | "globalnetworkpolicies" | "gnp" => {
                Ok(Self(ResourceKind::GlobalNetworkPolicy))
            }
            "globalnetworkset" | "globalnetworksets" | "gns" => {
                Ok(Self(ResourceKind::GlobalNetworkSet))
            }
            _ => Err(format!(
                "unknown resource type '{}', expected hep, gnp or gns",
                s
            )),
        }
    }
}

/// Read a YAML (`.yaml`/`.yml`) or JSON (`.json`) resource file.
pub fn load_file<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("could not read file {}", path))?;
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).with_context(|| format!("error parsing file {}", path))
        }
        Some("json") => {
            serde_json::from_str(&content).with_context(|| format!("error parsing file {}", path))
        }
        _ => bail!("unsupported file extension for {}", path),
    }
}

/// Load a resource file as `kind` and return it as the JSON body to send.
pub fn load_resource(kind: ResourceType, path: &str) -> anyhow::Result<Value> {
    let value = match kind.0 {
        ResourceKind::HostEndpoint => serde_json::to_value(load_file::<HostEndpoint>(path)?)?,
        ResourceKind::GlobalNetworkPolicy => {
            serde_json::to_value(load_file::<GlobalNetworkPolicy>(path)?)?
        }
        ResourceKind::GlobalNetworkSet => {
            serde_json::to_value(load_file::<GlobalNetworkSet>(path)?)?
        }
    };
    Ok(value)
}

/// Run the server-side write checks locally.
pub fn validate_file(kind: ResourceType, path: &str) -> anyhow::Result<()> {
    let result = match kind.0 {
        ResourceKind::HostEndpoint => validate_host_endpoint(&load_file(path)?),
        ResourceKind::GlobalNetworkPolicy => validate_global_network_policy(&load_file(path)?),
        ResourceKind::GlobalNetworkSet => validate_global_network_set(&load_file(path)?),
    };
    result.with_context(|| format!("{} is not a valid {}", path, kind.0))
}

/// Name from a resource file's metadata.
pub fn resource_name(resource: &Value) -> Option<&str> {
    resource["metadata"]["name"].as_str()
}
