use chrono::{DateTime, Utc};
use pkg_constants::policy::{
    GNS_V4_EMPTY_NAME, GNS_V4_EMPTY_UUID, GNS_V6_EMPTY_NAME, GNS_V6_EMPTY_UUID,
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::metadata::{IpVersion, ResourceMetadata};
use crate::net::split_nets;

/// Named collection of networks, selectable by label from policy rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalNetworkSet {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub version: u64,
    pub metadata: ResourceMetadata,
    #[serde(default)]
    pub spec: GnsSpec,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GnsSpec {
    /// Networks exactly as declared (CIDRs or bare IPs).
    #[serde(default)]
    pub nets: Vec<String>,
    /// Normalised IPv4 networks, derived from `nets` at write time.
    #[serde(default)]
    pub nets_v4: Vec<String>,
    /// Normalised IPv6 networks, derived from `nets` at write time.
    #[serde(default)]
    pub nets_v6: Vec<String>,
}

impl GlobalNetworkSet {
    /// Recompute `nets_v4`/`nets_v6` from the declared `nets`.
    pub fn derive_nets(&mut self) {
        let (v4, v6) = split_nets(&self.spec.nets);
        self.spec.nets_v4 = v4;
        self.spec.nets_v6 = v6;
    }

    pub fn nets_for(&self, version: IpVersion) -> &[String] {
        match version {
            IpVersion::V4 => &self.spec.nets_v4,
            IpVersion::V6 => &self.spec.nets_v6,
        }
    }

    /// Placeholder set standing in for "selector matched nothing" in
    /// resolved output. Identity is fixed across restarts.
    pub fn empty_for(version: IpVersion) -> &'static GlobalNetworkSet {
        match version {
            IpVersion::V4 => &GNS_V4_EMPTY,
            IpVersion::V6 => &GNS_V6_EMPTY,
        }
    }

    pub fn is_empty_placeholder(&self) -> bool {
        self.uuid == GNS_V4_EMPTY_UUID || self.uuid == GNS_V6_EMPTY_UUID
    }
}

static GNS_V4_EMPTY: LazyLock<GlobalNetworkSet> =
    LazyLock::new(|| placeholder(GNS_V4_EMPTY_UUID, GNS_V4_EMPTY_NAME));
static GNS_V6_EMPTY: LazyLock<GlobalNetworkSet> =
    LazyLock::new(|| placeholder(GNS_V6_EMPTY_UUID, GNS_V6_EMPTY_NAME));

fn placeholder(uuid: &str, name: &str) -> GlobalNetworkSet {
    GlobalNetworkSet {
        uuid: uuid.to_string(),
        version: 1,
        metadata: ResourceMetadata {
            name: name.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}
