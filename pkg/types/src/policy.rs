//! Resolved, per-host view of the policy catalog. Built fresh for every
//! fetch and never stored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::gns::GlobalNetworkSet;
use crate::hep::HostEndpoint;
use crate::metadata::IpVersion;

/// Everything a host needs to program its firewall.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEndpointPolicy {
    pub metadata: PolicyVersions,
    pub hep: HostEndpoint,
    /// Matching policies, in ascending order.
    pub parsed_gnps: Vec<ParsedGnp>,
    /// Host endpoints referenced by any rule, first-seen order, no duplicates.
    pub parsed_heps: Vec<ParsedHep>,
    /// Network sets referenced by any rule, first-seen order, no duplicates.
    pub parsed_gnss: Vec<ParsedGns>,
}

/// Version stamps of every object that contributed to a resolution, keyed by UUID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyVersions {
    pub gnp_versions: BTreeMap<String, u64>,
    pub hep_versions: BTreeMap<String, u64>,
    pub gns_versions: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedGnp {
    pub uuid: String,
    pub version: u64,
    pub name: String,
    pub inbound_rules: Vec<ParsedRule>,
    pub outbound_rules: Vec<ParsedRule>,
}

/// A rule with every selector replaced by concrete object references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRule {
    pub action: String,
    pub ip_version: IpVersion,
    pub protocol: String,
    pub is_protocol_negative: bool,
    pub src_nets: Vec<String>,
    pub is_src_net_negative: bool,
    #[serde(rename = "srcGNSUUIDs")]
    pub src_gns_uuids: Vec<String>,
    #[serde(rename = "srcHEPUUIDs")]
    pub src_hep_uuids: Vec<String>,
    pub src_ports: Vec<String>,
    pub is_src_port_negative: bool,
    pub dst_nets: Vec<String>,
    pub is_dst_net_negative: bool,
    #[serde(rename = "dstGNSUUIDs")]
    pub dst_gns_uuids: Vec<String>,
    #[serde(rename = "dstHEPUUIDs")]
    pub dst_hep_uuids: Vec<String>,
    pub dst_ports: Vec<String>,
    pub is_dst_port_negative: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedHep {
    pub uuid: String,
    pub name: String,
    pub tenant_id: u64,
    pub ip: String,
    pub ips_v4: Vec<String>,
    pub ips_v6: Vec<String>,
}

impl From<&HostEndpoint> for ParsedHep {
    fn from(hep: &HostEndpoint) -> Self {
        Self {
            uuid: hep.uuid.clone(),
            name: hep.metadata.name.clone(),
            tenant_id: hep.spec.tenant_id,
            ip: hep.primary_ip(),
            ips_v4: hep.spec.ips_v4.clone(),
            ips_v6: hep.spec.ips_v6.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedGns {
    pub uuid: String,
    pub name: String,
    pub nets_v4: Vec<String>,
    pub nets_v6: Vec<String>,
}

impl From<&GlobalNetworkSet> for ParsedGns {
    fn from(set: &GlobalNetworkSet) -> Self {
        Self {
            uuid: set.uuid.clone(),
            name: set.metadata.name.clone(),
            nets_v4: set.spec.nets_v4.clone(),
            nets_v6: set.spec.nets_v6.clone(),
        }
    }
}
