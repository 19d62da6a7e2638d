//! Write-path validation. Everything here runs before a resource reaches
//! the store, so the resolver only ever sees selectors that compiled once.

use pkg_selector::SelectorError;
use std::collections::HashSet;
use thiserror::Error;

use crate::gnp::{GlobalNetworkPolicy, GnpRule, RuleEntity};
use crate::gns::GlobalNetworkSet;
use crate::hep::HostEndpoint;
use crate::metadata::IpVersion;
use crate::net::{normalize_net, parse_cidr_or_ip, split_ips};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid selector: {source}")]
    Selector {
        field: String,
        #[source]
        source: SelectorError,
    },

    #[error("{field}: {message}")]
    Field { field: String, message: String },
}

impl ValidationError {
    fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::Field {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All violations found in one resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Validate a resource name.
/// Rules: `[-a-zA-Z0-9_.]`, at least one character.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::field("metadata.name", "name must not be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ValidationError::field(
            "metadata.name",
            format!(
                "name '{}' must contain only letters, digits, '-', '_' and '.'",
                name
            ),
        ));
    }
    Ok(())
}

/// Reject selector text that does not compile. The compiled form is discarded.
pub fn validate_selector(field: &str, text: &str) -> Result<(), ValidationError> {
    pkg_selector::parse(text)
        .map(|_| ())
        .map_err(|source| ValidationError::Selector {
            field: field.to_string(),
            source,
        })
}

pub fn validate_global_network_policy(gnp: &GlobalNetworkPolicy) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    if let Err(e) = validate_name(&gnp.metadata.name) {
        errors.push(e);
    }
    if let Err(e) = validate_selector("spec.selector", &gnp.spec.selector) {
        errors.push(e);
    }
    if gnp.spec.ingress.is_empty() && gnp.spec.egress.is_empty() {
        errors.push(ValidationError::field(
            "spec",
            "require at least one ingress or egress rule",
        ));
    }
    for (i, rule) in gnp.spec.ingress.iter().enumerate() {
        validate_rule(&format!("spec.ingress[{}]", i), rule, &mut errors);
    }
    for (i, rule) in gnp.spec.egress.iter().enumerate() {
        validate_rule(&format!("spec.egress[{}]", i), rule, &mut errors);
    }
    ValidationErrors(errors).into_result()
}

fn validate_rule(path: &str, rule: &GnpRule, errors: &mut Vec<ValidationError>) {
    if rule.protocol.is_some() && rule.not_protocol.is_some() {
        errors.push(ValidationError::field(
            format!("{}.notProtocol", path),
            "cannot use notProtocol with protocol",
        ));
    }

    let protocol = rule.protocol.as_ref().or(rule.not_protocol.as_ref());
    if let Some(p) = protocol {
        if !p.is_known() {
            errors.push(ValidationError::field(
                format!("{}.protocol", path),
                format!("unsupported protocol '{}'", p),
            ));
        }
    }
    let ports_allowed = protocol.is_none_or(|p| p.supports_ports());

    for (side, entity) in [("source", &rule.source), ("destination", &rule.destination)] {
        if let Some(entity) = entity {
            let entity_path = format!("{}.{}", path, side);
            validate_rule_entity(&entity_path, rule.ip_version, entity, errors);
            if !ports_allowed && (!entity.ports.is_empty() || !entity.not_ports.is_empty()) {
                errors.push(ValidationError::field(
                    format!("{}.ports", entity_path),
                    "protocol does not support ports",
                ));
            }
        }
    }
}

fn validate_rule_entity(
    path: &str,
    ip_version: IpVersion,
    entity: &RuleEntity,
    errors: &mut Vec<ValidationError>,
) {
    if let Err(e) = validate_selector(&format!("{}.selector", path), &entity.selector) {
        errors.push(e);
    }
    if !entity.nets.is_empty() && !entity.not_nets.is_empty() {
        errors.push(ValidationError::field(
            format!("{}.notNets", path),
            "cannot use notNets with nets",
        ));
    }
    if !entity.ports.is_empty() && !entity.not_ports.is_empty() {
        errors.push(ValidationError::field(
            format!("{}.notPorts", path),
            "cannot use notPorts with ports",
        ));
    }
    for (field, nets) in [("nets", &entity.nets), ("notNets", &entity.not_nets)] {
        for (i, raw) in nets.iter().enumerate() {
            let at = format!("{}.{}[{}]", path, field, i);
            match parse_cidr_or_ip(raw) {
                None => errors.push(ValidationError::field(at, format!("invalid net '{}'", raw))),
                Some((ip, net)) => {
                    if ip != net.network() {
                        errors.push(ValidationError::field(
                            at.clone(),
                            format!("'{}' is not a network address", raw),
                        ));
                    }
                    if IpVersion::of(&ip) != ip_version {
                        errors.push(ValidationError::field(
                            at,
                            format!("'{}' does not match ipVersion {}", raw, ip_version),
                        ));
                    }
                }
            }
        }
    }
}

pub fn validate_global_network_set(gns: &GlobalNetworkSet) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    if let Err(e) = validate_name(&gns.metadata.name) {
        errors.push(e);
    }
    let mut seen = HashSet::new();
    for (i, raw) in gns.spec.nets.iter().enumerate() {
        let at = format!("spec.nets[{}]", i);
        match normalize_net(raw) {
            None => errors.push(ValidationError::field(at, format!("invalid net '{}'", raw))),
            Some((_, net)) => {
                if !seen.insert(net.clone()) {
                    errors.push(ValidationError::field(at, format!("duplicate net '{}'", net)));
                }
            }
        }
    }
    ValidationErrors(errors).into_result()
}

/// Host endpoint names taken by fixed routes under `/api/v1/hostendpoints/`.
pub const RESERVED_HOST_ENDPOINT_NAMES: &[&str] = &["policies", "by-address"];

pub fn validate_host_endpoint(hep: &HostEndpoint) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    if let Err(e) = validate_name(&hep.metadata.name) {
        errors.push(e);
    }
    if RESERVED_HOST_ENDPOINT_NAMES.contains(&hep.metadata.name.as_str()) {
        errors.push(ValidationError::field(
            "metadata.name",
            format!("name '{}' is reserved", hep.metadata.name),
        ));
    }
    let (v4, _) = split_ips(&hep.spec.ips);
    if v4.is_empty() {
        errors.push(ValidationError::field(
            "spec.ips",
            "required at least one IP version 4",
        ));
    }
    ValidationErrors(errors).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnp::{PortSpec, Protocol, RuleAction};
    use crate::metadata::ResourceMetadata;

    fn gnp_with(rule: GnpRule) -> GlobalNetworkPolicy {
        GlobalNetworkPolicy {
            metadata: ResourceMetadata {
                name: "p".to_string(),
                ..Default::default()
            },
            spec: crate::gnp::GnpSpec {
                ingress: vec![rule],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn valid_names() {
        assert!(validate_name("web").is_ok());
        assert!(validate_name("web_01.prod-a").is_ok());
        assert!(validate_name("Mixed.Case").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("slash/name").is_err());
        assert!(validate_name("emoji-\u{1F525}").is_err());
    }

    #[test]
    fn selector_errors_are_rejected() {
        let err = validate_selector("spec.selector", "role == 'db").unwrap_err();
        assert!(matches!(err, ValidationError::Selector { .. }));
        assert!(validate_selector("spec.selector", "").is_ok());
    }

    #[test]
    fn policy_without_rules_is_rejected() {
        let mut gnp = gnp_with(GnpRule::default());
        gnp.spec.ingress.clear();
        let errs = validate_global_network_policy(&gnp).unwrap_err();
        assert_eq!(errs.0.len(), 1);
    }

    #[test]
    fn malformed_policy_selector_is_rejected() {
        let mut gnp = gnp_with(GnpRule::default());
        gnp.spec.selector = "role in {'a'".to_string();
        let errs = validate_global_network_policy(&gnp).unwrap_err();
        assert!(errs.to_string().contains("spec.selector"));
    }

    #[test]
    fn protocol_and_not_protocol_are_exclusive() {
        let rule = GnpRule {
            action: RuleAction::Allow,
            protocol: Some(Protocol::Name("tcp".to_string())),
            not_protocol: Some(Protocol::Name("udp".to_string())),
            ..Default::default()
        };
        let errs = validate_global_network_policy(&gnp_with(rule)).unwrap_err();
        assert!(errs.to_string().contains("notProtocol"));
    }

    #[test]
    fn ports_need_a_ported_protocol() {
        let rule = GnpRule {
            protocol: Some(Protocol::Name("icmp".to_string())),
            destination: Some(RuleEntity {
                ports: vec![PortSpec::Number(22)],
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_global_network_policy(&gnp_with(rule)).is_err());

        let rule = GnpRule {
            protocol: Some(Protocol::Number(6)),
            destination: Some(RuleEntity {
                ports: vec![PortSpec::Number(22)],
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_global_network_policy(&gnp_with(rule)).is_ok());
    }

    #[test]
    fn entity_exclusivity_and_nets() {
        let rule = GnpRule {
            source: Some(RuleEntity {
                selector: "has(x)".to_string(),
                nets: vec!["10.0.0.0/8".to_string()],
                not_nets: vec!["10.1.0.0/16".to_string()],
                ports: vec![PortSpec::Number(1)],
                not_ports: vec![PortSpec::Number(2)],
            }),
            ..Default::default()
        };
        let errs = validate_global_network_policy(&gnp_with(rule)).unwrap_err();
        assert_eq!(errs.0.len(), 2);

        let rule = GnpRule {
            ip_version: IpVersion::V4,
            destination: Some(RuleEntity {
                nets: vec![
                    "10.0.0.1/8".to_string(),
                    "2001:db8::/32".to_string(),
                    "garbage".to_string(),
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        let errs = validate_global_network_policy(&gnp_with(rule)).unwrap_err();
        assert_eq!(errs.0.len(), 3);
    }

    #[test]
    fn network_set_rejects_duplicates() {
        let gns = GlobalNetworkSet {
            metadata: ResourceMetadata {
                name: "s".to_string(),
                ..Default::default()
            },
            spec: crate::gns::GnsSpec {
                nets: vec!["10.0.0.1".to_string(), "10.0.0.1/32".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let errs = validate_global_network_set(&gns).unwrap_err();
        assert!(errs.to_string().contains("duplicate"));
    }

    #[test]
    fn host_endpoint_needs_ipv4() {
        let mut hep = HostEndpoint {
            metadata: ResourceMetadata {
                name: "h".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        hep.spec.ips = vec!["fe80::1".to_string()];
        assert!(validate_host_endpoint(&hep).is_err());
        hep.spec.ips.push("10.0.0.1".to_string());
        assert!(validate_host_endpoint(&hep).is_ok());
    }

    #[test]
    fn host_endpoint_names_shadowed_by_routes_are_rejected() {
        for name in ["policies", "by-address"] {
            let hep = HostEndpoint {
                metadata: ResourceMetadata {
                    name: name.to_string(),
                    ..Default::default()
                },
                spec: crate::hep::HostEndpointSpec {
                    ips: vec!["10.0.0.1".to_string()],
                    ..Default::default()
                },
                ..Default::default()
            };
            let errs = validate_host_endpoint(&hep).unwrap_err();
            assert!(errs.to_string().contains("reserved"));
        }
    }
}
