use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name and labels shared by every resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// The three user-managed resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    HostEndpoint,
    GlobalNetworkPolicy,
    GlobalNetworkSet,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::HostEndpoint => write!(f, "HostEndpoint"),
            ResourceKind::GlobalNetworkPolicy => write!(f, "GlobalNetworkPolicy"),
            ResourceKind::GlobalNetworkSet => write!(f, "GlobalNetworkSet"),
        }
    }
}

// --- IP version ---

/// IP family a rule or address belongs to. Serialized as the bare number 4 or 6.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IpVersion {
    #[default]
    V4,
    V6,
}

impl IpVersion {
    pub fn number(self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }

    pub fn of(addr: &std::net::IpAddr) -> Self {
        if addr.is_ipv4() {
            IpVersion::V4
        } else {
            IpVersion::V6
        }
    }
}

impl TryFrom<u8> for IpVersion {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(IpVersion::V4),
            6 => Ok(IpVersion::V6),
            other => Err(format!("ip version must be 4 or 6, got {}", other)),
        }
    }
}

impl From<IpVersion> for u8 {
    fn from(v: IpVersion) -> Self {
        v.number()
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}
