use chrono::{DateTime, Utc};
use pkg_constants::policy::POLICY_ORDER_LOWEST;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::metadata::{IpVersion, ResourceMetadata};

/// Ordered set of ingress/egress rules applied to every host endpoint whose
/// labels match `spec.selector`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalNetworkPolicy {
    /// Assigned by the server on first create; preserved on update.
    #[serde(default)]
    pub uuid: String,
    /// Starts at 1 and increments on every successful write.
    #[serde(default)]
    pub version: u64,
    pub metadata: ResourceMetadata,
    pub spec: GnpSpec,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl GlobalNetworkPolicy {
    /// Sort key; policies without an explicit order go last.
    pub fn effective_order(&self) -> u64 {
        self.spec.order.unwrap_or(POLICY_ORDER_LOWEST)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GnpSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u64>,
    /// Which host endpoints the policy applies to. Empty matches all.
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub ingress: Vec<GnpRule>,
    #[serde(default)]
    pub egress: Vec<GnpRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GnpRule {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    pub action: RuleAction,
    #[serde(default)]
    pub ip_version: IpVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RuleEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<RuleEntity>,
}

/// Source or destination side of a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEntity {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selector: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_nets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_ports: Vec<PortSpec>,
}

// --- Rule action ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RuleAction {
    #[default]
    Allow,
    Deny,
    Log,
    Pass,
}

impl RuleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleAction::Allow => "allow",
            RuleAction::Deny => "deny",
            RuleAction::Log => "log",
            RuleAction::Pass => "pass",
        }
    }
}

impl std::str::FromStr for RuleAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(RuleAction::Allow),
            "deny" => Ok(RuleAction::Deny),
            "log" => Ok(RuleAction::Log),
            "pass" => Ok(RuleAction::Pass),
            _ => Err(format!(
                "unknown action '{}', expected one of allow, deny, log, pass",
                s
            )),
        }
    }
}

impl TryFrom<String> for RuleAction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RuleAction> for String {
    fn from(action: RuleAction) -> Self {
        action.as_str().to_string()
    }
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- Protocol ---

/// A protocol given either by name (`tcp`) or IANA number (`6`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Protocol {
    Number(u8),
    Name(String),
}

pub const PROTOCOL_NAMES: &[&str] = &["tcp", "udp", "icmp", "sctp", "udplite"];
const PORTED_PROTOCOL_NAMES: &[&str] = &["tcp", "udp", "sctp"];
const PORTED_PROTOCOL_NUMBERS: &[u8] = &[6, 17, 132];

impl Protocol {
    /// Lowercased name or decimal number, as handed to hosts.
    pub fn canonical(&self) -> String {
        match self {
            Protocol::Number(n) => n.to_string(),
            Protocol::Name(name) => name.to_ascii_lowercase(),
        }
    }

    pub fn is_known(&self) -> bool {
        match self {
            Protocol::Number(_) => true,
            Protocol::Name(name) => PROTOCOL_NAMES.contains(&name.to_ascii_lowercase().as_str()),
        }
    }

    /// Whether port matching is meaningful for this protocol.
    pub fn supports_ports(&self) -> bool {
        match self {
            Protocol::Number(n) => PORTED_PROTOCOL_NUMBERS.contains(n),
            Protocol::Name(name) => {
                PORTED_PROTOCOL_NAMES.contains(&name.to_ascii_lowercase().as_str())
            }
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

// --- Ports ---

/// A single port (`80`) or an inclusive range written `"1000:2000"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPort", into = "RawPort")]
pub enum PortSpec {
    Number(u16),
    Range(u16, u16),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawPort {
    Number(u16),
    Text(String),
}

impl std::str::FromStr for PortSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_part = |part: &str| -> Result<u16, String> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("invalid port range '{}', expected start:end", s));
            }
            part.parse::<u16>()
                .map_err(|_| format!("port in '{}' exceeds 65535", s))
        };
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid port range '{}', expected start:end", s))?;
        let (start, end) = (parse_part(start)?, parse_part(end)?);
        if start > end {
            return Err(format!("port range '{}' starts after it ends", s));
        }
        Ok(PortSpec::Range(start, end))
    }
}

impl TryFrom<RawPort> for PortSpec {
    type Error = String;

    fn try_from(raw: RawPort) -> Result<Self, Self::Error> {
        match raw {
            RawPort::Number(n) => Ok(PortSpec::Number(n)),
            RawPort::Text(s) => s.parse(),
        }
    }
}

impl From<PortSpec> for RawPort {
    fn from(port: PortSpec) -> Self {
        match port {
            PortSpec::Number(n) => RawPort::Number(n),
            range @ PortSpec::Range(..) => RawPort::Text(range.to_string()),
        }
    }
}

impl std::fmt::Display for PortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortSpec::Number(n) => write!(f, "{}", n),
            PortSpec::Range(start, end) => write!(f, "{}:{}", start, end),
        }
    }
}
