use chrono::{DateTime, Utc};
use pkg_constants::policy::DEFAULT_TENANT_ID;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::metadata::{IpVersion, ResourceMetadata};
use crate::net::split_ips;

/// A network-attached host that fetches its resolved firewall program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEndpoint {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub version: u64,
    pub metadata: ResourceMetadata,
    pub spec: HostEndpointSpec,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEndpointSpec {
    #[serde(default)]
    pub interface_name: String,
    /// Primary address. Defaults to the first IPv4 address in `ips`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    /// Zero on input means the default tenant.
    #[serde(default)]
    pub tenant_id: u64,
    #[serde(default)]
    pub ips: Vec<String>,
    #[serde(default)]
    pub ips_v4: Vec<String>,
    #[serde(default)]
    pub ips_v6: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<HostEndpointPort>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEndpointPort {
    pub name: String,
    pub port: u16,
    pub protocol: String,
}

impl HostEndpoint {
    /// Fill write-time derived fields: address families, primary IP and tenant.
    pub fn derive_addresses(&mut self) {
        let (v4, v6) = split_ips(&self.spec.ips);
        self.spec.ips_v4 = v4;
        self.spec.ips_v6 = v6;
        if self.spec.ip.is_none() {
            self.spec.ip = self
                .spec
                .ips_v4
                .first()
                .and_then(|ip| ip.parse::<IpAddr>().ok());
        }
        if self.spec.tenant_id == 0 {
            self.spec.tenant_id = DEFAULT_TENANT_ID;
        }
    }

    pub fn ips_for(&self, version: IpVersion) -> &[String] {
        match version {
            IpVersion::V4 => &self.spec.ips_v4,
            IpVersion::V6 => &self.spec.ips_v6,
        }
    }

    pub fn primary_ip(&self) -> String {
        self.spec.ip.map(|ip| ip.to_string()).unwrap_or_default()
    }
}
