use pkg_selector::{Selector, SelectorError};
use pkg_types::{
    GlobalNetworkPolicy, GlobalNetworkSet, GnpRule, HostEndpoint, HostEndpointPolicy, IpVersion,
    ParsedGnp, ParsedGns, ParsedHep, ParsedRule, PolicyVersions, PortSpec, RuleEntity,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Snapshot of every resource, read fresh for one fetch.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub host_endpoints: Vec<HostEndpoint>,
    pub policies: Vec<GlobalNetworkPolicy>,
    pub network_sets: Vec<GlobalNetworkSet>,
}

/// A selector that failed to compile and was left out of the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionWarning {
    pub policy_uuid: String,
    pub policy_name: String,
    /// `selector` for the policy itself, `ingress[0].source` etc. for rules.
    pub location: String,
    pub selector: String,
    pub error: String,
}

/// Output of resolving one host endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    pub policy: HostEndpointPolicy,
    pub warnings: Vec<ResolutionWarning>,
}

/// Turns a catalog into per-host policy bundles.
///
/// Policies are ordered and every selector is compiled once in [`Resolver::new`];
/// each call to [`Resolver::resolve`] then works on its own dedup state, so
/// one resolver can serve every host endpoint of the same snapshot.
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    policies: Vec<CompiledPolicy<'a>>,
}

struct CompiledPolicy<'a> {
    gnp: &'a GlobalNetworkPolicy,
    selector: Result<Selector, ResolutionWarning>,
    ingress: Vec<CompiledRule<'a>>,
    egress: Vec<CompiledRule<'a>>,
}

struct CompiledRule<'a> {
    rule: &'a GnpRule,
    source: EntitySelector,
    destination: EntitySelector,
}

enum EntitySelector {
    Absent,
    Valid(Selector),
    Malformed(ResolutionWarning),
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        let mut ordered: Vec<&GlobalNetworkPolicy> = catalog.policies.iter().collect();
        // Stable sort: equal orders keep catalog order.
        ordered.sort_by_key(|gnp| gnp.effective_order());
        let policies = ordered.into_iter().map(compile_policy).collect();
        Self { catalog, policies }
    }

    /// Resolve the bundle for a single host endpoint.
    pub fn resolve(&self, target: &HostEndpoint) -> Resolution {
        let mut bundle = Bundle::default();
        let mut warnings = Vec::new();
        let mut parsed_gnps = Vec::new();

        for policy in &self.policies {
            let selector = match &policy.selector {
                Ok(selector) => selector,
                Err(warning) => {
                    warnings.push(warning.clone());
                    continue;
                }
            };
            if !selector.evaluate(&target.metadata.labels) {
                continue;
            }

            let gnp = policy.gnp;
            bundle
                .versions
                .gnp_versions
                .insert(gnp.uuid.clone(), gnp.version);

            let inbound_rules = policy
                .ingress
                .iter()
                .map(|rule| self.expand_rule(rule, &mut bundle, &mut warnings))
                .collect();
            let outbound_rules = policy
                .egress
                .iter()
                .map(|rule| self.expand_rule(rule, &mut bundle, &mut warnings))
                .collect();

            parsed_gnps.push(ParsedGnp {
                uuid: gnp.uuid.clone(),
                version: gnp.version,
                name: gnp.metadata.name.clone(),
                inbound_rules,
                outbound_rules,
            });
        }

        debug!(
            hep = %target.metadata.name,
            policies = parsed_gnps.len(),
            heps = bundle.heps.len(),
            gnss = bundle.gnss.len(),
            "Resolved host endpoint policies"
        );

        Resolution {
            policy: HostEndpointPolicy {
                metadata: bundle.versions,
                hep: target.clone(),
                parsed_gnps,
                parsed_heps: bundle.heps,
                parsed_gnss: bundle.gnss,
            },
            warnings,
        }
    }

    /// Resolve every host endpoint in the catalog, one independent bundle each.
    pub fn resolve_all(&self) -> Vec<Resolution> {
        self.catalog
            .host_endpoints
            .iter()
            .map(|hep| self.resolve(hep))
            .collect()
    }

    fn expand_rule(
        &self,
        compiled: &CompiledRule<'_>,
        bundle: &mut Bundle,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> ParsedRule {
        let rule = compiled.rule;
        let (protocol, is_protocol_negative) = match (&rule.protocol, &rule.not_protocol) {
            (Some(p), _) => (p.canonical(), false),
            (None, Some(p)) => (p.canonical(), true),
            (None, None) => (String::new(), false),
        };

        let src = self.expand_entity(
            rule.source.as_ref(),
            &compiled.source,
            rule.ip_version,
            bundle,
            warnings,
        );
        let dst = self.expand_entity(
            rule.destination.as_ref(),
            &compiled.destination,
            rule.ip_version,
            bundle,
            warnings,
        );

        ParsedRule {
            action: rule.action.as_str().to_string(),
            ip_version: rule.ip_version,
            protocol,
            is_protocol_negative,
            src_nets: src.nets,
            is_src_net_negative: src.is_net_negative,
            src_gns_uuids: src.gns_uuids,
            src_hep_uuids: src.hep_uuids,
            src_ports: src.ports,
            is_src_port_negative: src.is_port_negative,
            dst_nets: dst.nets,
            is_dst_net_negative: dst.is_net_negative,
            dst_gns_uuids: dst.gns_uuids,
            dst_hep_uuids: dst.hep_uuids,
            dst_ports: dst.ports,
            is_dst_port_negative: dst.is_port_negative,
        }
    }

    fn expand_entity(
        &self,
        entity: Option<&RuleEntity>,
        selector: &EntitySelector,
        version: IpVersion,
        bundle: &mut Bundle,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> ResolvedEntity {
        let Some(entity) = entity else {
            return ResolvedEntity::default();
        };

        let (nets, is_net_negative) = pick(&entity.nets, &entity.not_nets, String::clone);
        let (ports, is_port_negative) = pick(&entity.ports, &entity.not_ports, PortSpec::to_string);
        let mut resolved = ResolvedEntity {
            nets,
            is_net_negative,
            ports,
            is_port_negative,
            ..Default::default()
        };

        match selector {
            EntitySelector::Absent => {}
            EntitySelector::Malformed(warning) => warnings.push(warning.clone()),
            EntitySelector::Valid(selector) => {
                self.match_selector(selector, version, bundle, &mut resolved)
            }
        }
        resolved
    }

    /// Collect every HEP and GNS the selector picks for `version`. Objects
    /// without addresses of that family never match. When nothing matches,
    /// the empty placeholder set for the family stands in.
    fn match_selector(
        &self,
        selector: &Selector,
        version: IpVersion,
        bundle: &mut Bundle,
        out: &mut ResolvedEntity,
    ) {
        for hep in &self.catalog.host_endpoints {
            if !hep.ips_for(version).is_empty() && selector.evaluate(&hep.metadata.labels) {
                out.hep_uuids.push(hep.uuid.clone());
                bundle.add_hep(hep);
            }
        }
        for gns in &self.catalog.network_sets {
            if !gns.nets_for(version).is_empty() && selector.evaluate(&gns.metadata.labels) {
                out.gns_uuids.push(gns.uuid.clone());
                bundle.add_gns(gns);
            }
        }

        if out.hep_uuids.is_empty() && out.gns_uuids.is_empty() {
            let empty = GlobalNetworkSet::empty_for(version);
            out.gns_uuids.push(empty.uuid.clone());
            bundle.add_gns(empty);
        }
    }
}

// --- Per-resolution state ---

#[derive(Default)]
struct Bundle {
    versions: PolicyVersions,
    seen_heps: HashSet<String>,
    seen_gnss: HashSet<String>,
    heps: Vec<ParsedHep>,
    gnss: Vec<ParsedGns>,
}

impl Bundle {
    fn add_hep(&mut self, hep: &HostEndpoint) {
        if self.seen_heps.insert(hep.uuid.clone()) {
            self.versions
                .hep_versions
                .insert(hep.uuid.clone(), hep.version);
            self.heps.push(ParsedHep::from(hep));
        }
    }

    fn add_gns(&mut self, gns: &GlobalNetworkSet) {
        if self.seen_gnss.insert(gns.uuid.clone()) {
            self.versions
                .gns_versions
                .insert(gns.uuid.clone(), gns.version);
            self.gnss.push(ParsedGns::from(gns));
        }
    }
}

#[derive(Default)]
struct ResolvedEntity {
    nets: Vec<String>,
    is_net_negative: bool,
    ports: Vec<String>,
    is_port_negative: bool,
    gns_uuids: Vec<String>,
    hep_uuids: Vec<String>,
}

/// The positive list if set, otherwise the negated one.
fn pick<T>(positive: &[T], negative: &[T], render: impl Fn(&T) -> String) -> (Vec<String>, bool) {
    if !positive.is_empty() {
        (positive.iter().map(&render).collect(), false)
    } else if !negative.is_empty() {
        (negative.iter().map(&render).collect(), true)
    } else {
        (Vec::new(), false)
    }
}

// --- Selector compilation ---

fn compile_policy(gnp: &GlobalNetworkPolicy) -> CompiledPolicy<'_> {
    let selector = pkg_selector::parse(&gnp.spec.selector).map_err(|e| {
        warn!(
            policy_uuid = %gnp.uuid,
            policy = %gnp.metadata.name,
            selector = %gnp.spec.selector,
            error = %e,
            "Skipping policy with malformed selector"
        );
        warning(gnp, "selector".to_string(), &gnp.spec.selector, &e)
    });

    // Rules of a skipped policy are never expanded.
    let (ingress, egress) = if selector.is_ok() {
        (
            compile_rules(gnp, "ingress", &gnp.spec.ingress),
            compile_rules(gnp, "egress", &gnp.spec.egress),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    CompiledPolicy {
        gnp,
        selector,
        ingress,
        egress,
    }
}

fn compile_rules<'a>(
    gnp: &'a GlobalNetworkPolicy,
    direction: &str,
    rules: &'a [GnpRule],
) -> Vec<CompiledRule<'a>> {
    rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            let at = format!("{}[{}]", direction, i);
            CompiledRule {
                rule,
                source: compile_entity(gnp, &at, "source", rule.source.as_ref()),
                destination: compile_entity(gnp, &at, "destination", rule.destination.as_ref()),
            }
        })
        .collect()
}

fn compile_entity(
    gnp: &GlobalNetworkPolicy,
    rule_at: &str,
    side: &str,
    entity: Option<&RuleEntity>,
) -> EntitySelector {
    let Some(text) = entity
        .map(|e| e.selector.as_str())
        .filter(|s| !s.is_empty())
    else {
        return EntitySelector::Absent;
    };

    match pkg_selector::parse(text) {
        Ok(selector) => EntitySelector::Valid(selector),
        Err(e) => {
            warn!(
                policy_uuid = %gnp.uuid,
                policy = %gnp.metadata.name,
                rule = %rule_at,
                direction = %side,
                selector = %text,
                error = %e,
                "Ignoring malformed rule selector"
            );
            EntitySelector::Malformed(warning(gnp, format!("{}.{}", rule_at, side), text, &e))
        }
    }
}

fn warning(
    gnp: &GlobalNetworkPolicy,
    location: String,
    selector: &str,
    error: &SelectorError,
) -> ResolutionWarning {
    ResolutionWarning {
        policy_uuid: gnp.uuid.clone(),
        policy_name: gnp.metadata.name.clone(),
        location,
        selector: selector.to_string(),
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_constants::policy::{GNS_V4_EMPTY_UUID, GNS_V6_EMPTY_UUID};
    use pkg_types::{
        GnpSpec, GnsSpec, HostEndpointSpec, Protocol, ResourceMetadata, RuleAction,
    };
    use std::collections::HashMap;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn make_hep(name: &str, pairs: &[(&str, &str)], ips: &[&str]) -> HostEndpoint {
        let mut hep = HostEndpoint {
            uuid: format!("{}-uuid", name),
            version: 1,
            metadata: ResourceMetadata {
                name: name.to_string(),
                labels: labels(pairs),
            },
            spec: HostEndpointSpec {
                ips: ips.iter().map(|ip| ip.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        };
        hep.derive_addresses();
        hep
    }

    fn make_gns(name: &str, pairs: &[(&str, &str)], nets: &[&str]) -> GlobalNetworkSet {
        let mut gns = GlobalNetworkSet {
            uuid: format!("{}-uuid", name),
            version: 3,
            metadata: ResourceMetadata {
                name: name.to_string(),
                labels: labels(pairs),
            },
            spec: GnsSpec {
                nets: nets.iter().map(|n| n.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        };
        gns.derive_nets();
        gns
    }

    fn make_gnp(name: &str, order: Option<u64>, selector: &str, ingress: Vec<GnpRule>) -> GlobalNetworkPolicy {
        GlobalNetworkPolicy {
            uuid: format!("{}-uuid", name),
            version: 2,
            metadata: ResourceMetadata {
                name: name.to_string(),
                ..Default::default()
            },
            spec: GnpSpec {
                order,
                selector: selector.to_string(),
                ingress,
                egress: vec![],
            },
            ..Default::default()
        }
    }

    fn from_selector(selector: &str) -> GnpRule {
        GnpRule {
            action: RuleAction::Allow,
            source: Some(RuleEntity {
                selector: selector.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn target() -> HostEndpoint {
        make_hep("web-1", &[("role", "web")], &["10.0.0.1"])
    }

    fn names(resolution: &Resolution) -> Vec<&str> {
        resolution
            .policy
            .parsed_gnps
            .iter()
            .map(|gnp| gnp.name.as_str())
            .collect()
    }

    #[test]
    fn policies_resolve_in_ascending_order_with_unordered_last() {
        let catalog = Catalog {
            host_endpoints: vec![target()],
            policies: vec![
                make_gnp("five", Some(5), "", vec![]),
                make_gnp("none", None, "", vec![]),
                make_gnp("one", Some(1), "", vec![]),
            ],
            network_sets: vec![],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        assert_eq!(names(&resolution), vec!["one", "five", "none"]);
    }

    #[test]
    fn equal_orders_keep_catalog_order() {
        let catalog = Catalog {
            host_endpoints: vec![],
            policies: vec![
                make_gnp("b", Some(1), "", vec![]),
                make_gnp("a", Some(1), "", vec![]),
                make_gnp("c", None, "", vec![]),
                make_gnp("d", None, "", vec![]),
            ],
            network_sets: vec![],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        assert_eq!(names(&resolution), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn non_matching_policy_is_skipped() {
        let catalog = Catalog {
            host_endpoints: vec![],
            policies: vec![
                make_gnp("db-only", Some(1), "role == 'db'", vec![]),
                make_gnp("web-only", Some(2), "role == 'web'", vec![]),
            ],
            network_sets: vec![],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        assert_eq!(names(&resolution), vec!["web-only"]);
        assert_eq!(resolution.policy.metadata.gnp_versions.len(), 1);
        assert_eq!(resolution.policy.metadata.gnp_versions["web-only-uuid"], 2);
    }

    #[test]
    fn empty_match_uses_sentinel_once() {
        let catalog = Catalog {
            host_endpoints: vec![target()],
            policies: vec![make_gnp(
                "p",
                Some(1),
                "",
                vec![from_selector("role == 'nobody'"), from_selector("zone == 'mars'")],
            )],
            network_sets: vec![],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        let rules = &resolution.policy.parsed_gnps[0].inbound_rules;
        assert_eq!(rules.len(), 2);
        for rule in rules {
            assert_eq!(rule.src_gns_uuids, vec![GNS_V4_EMPTY_UUID.to_string()]);
            assert!(rule.src_hep_uuids.is_empty());
        }
        assert_eq!(resolution.policy.parsed_gnss.len(), 1);
        assert_eq!(resolution.policy.parsed_gnss[0].uuid, GNS_V4_EMPTY_UUID);
        assert_eq!(resolution.policy.metadata.gns_versions[GNS_V4_EMPTY_UUID], 1);
        assert!(resolution.policy.parsed_heps.is_empty());
    }

    #[test]
    fn referenced_objects_are_deduplicated() {
        let db = make_hep("db-1", &[("role", "db")], &["10.0.1.1"]);
        let office = make_gns("office", &[("role", "db")], &["192.168.0.0/16"]);
        let catalog = Catalog {
            host_endpoints: vec![target(), db.clone()],
            policies: vec![
                make_gnp("a", Some(1), "", vec![from_selector("role == 'db'")]),
                make_gnp("b", Some(2), "", vec![from_selector("has(role) && role == 'db'")]),
            ],
            network_sets: vec![office.clone()],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        for gnp in &resolution.policy.parsed_gnps {
            let rule = &gnp.inbound_rules[0];
            assert_eq!(rule.src_hep_uuids, vec![db.uuid.clone()]);
            assert_eq!(rule.src_gns_uuids, vec![office.uuid.clone()]);
        }
        assert_eq!(resolution.policy.parsed_heps.len(), 1);
        assert_eq!(resolution.policy.parsed_heps[0].ip, "10.0.1.1");
        assert_eq!(resolution.policy.parsed_gnss.len(), 1);
        assert_eq!(resolution.policy.metadata.hep_versions[&db.uuid], 1);
        assert_eq!(resolution.policy.metadata.gns_versions[&office.uuid], 3);
    }

    #[test]
    fn malformed_policy_selector_is_contained() {
        let catalog = Catalog {
            host_endpoints: vec![target()],
            policies: vec![
                make_gnp("good-1", Some(1), "", vec![from_selector("")]),
                make_gnp("broken", Some(2), "role == 'web", vec![from_selector("")]),
                make_gnp("good-2", Some(3), "has(role)", vec![from_selector("")]),
            ],
            network_sets: vec![],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        assert_eq!(names(&resolution), vec!["good-1", "good-2"]);
        assert_eq!(resolution.warnings.len(), 1);
        assert_eq!(resolution.warnings[0].policy_uuid, "broken-uuid");
        assert_eq!(resolution.warnings[0].location, "selector");
        assert!(!resolution.policy.metadata.gnp_versions.contains_key("broken-uuid"));
    }

    #[test]
    fn malformed_rule_selector_is_treated_as_absent() {
        let catalog = Catalog {
            host_endpoints: vec![target()],
            policies: vec![make_gnp("p", Some(1), "", vec![from_selector("role in {'a'")])],
            network_sets: vec![],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        let rule = &resolution.policy.parsed_gnps[0].inbound_rules[0];
        assert!(rule.src_gns_uuids.is_empty());
        assert!(rule.src_hep_uuids.is_empty());
        assert!(resolution.policy.parsed_gnss.is_empty());
        assert_eq!(resolution.warnings.len(), 1);
        assert_eq!(resolution.warnings[0].location, "ingress[0].source");
    }

    #[test]
    fn empty_rule_selector_is_absent() {
        let catalog = Catalog {
            host_endpoints: vec![target()],
            policies: vec![make_gnp("p", Some(1), "", vec![from_selector("")])],
            network_sets: vec![],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        let rule = &resolution.policy.parsed_gnps[0].inbound_rules[0];
        assert!(rule.src_gns_uuids.is_empty());
        assert!(rule.src_hep_uuids.is_empty());
        assert!(resolution.policy.parsed_gnss.is_empty());
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn whitespace_rule_selector_matches_everything_of_its_family() {
        let db = make_hep("db", &[("role", "db")], &["10.0.1.1"]);
        let office = make_gns("office", &[], &["192.168.0.0/16"]);
        let catalog = Catalog {
            host_endpoints: vec![db.clone()],
            policies: vec![make_gnp("p", Some(1), "  ", vec![from_selector("  ")])],
            network_sets: vec![office.clone()],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        assert_eq!(names(&resolution), vec!["p"]);
        let rule = &resolution.policy.parsed_gnps[0].inbound_rules[0];
        assert_eq!(rule.src_hep_uuids, vec![db.uuid.clone()]);
        assert_eq!(rule.src_gns_uuids, vec![office.uuid.clone()]);
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn ip_version_filters_matches() {
        let v4_only = make_hep("v4", &[("tier", "x")], &["10.0.0.9"]);
        let dual = make_hep("dual", &[("tier", "x")], &["10.0.0.8", "fd00::8"]);
        let v4_set = make_gns("v4-set", &[("tier", "x")], &["172.16.0.0/12"]);
        let mut rule = from_selector("tier == 'x'");
        rule.ip_version = IpVersion::V6;
        let catalog = Catalog {
            host_endpoints: vec![v4_only, dual.clone()],
            policies: vec![make_gnp("p", Some(1), "", vec![rule])],
            network_sets: vec![v4_set],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        let parsed = &resolution.policy.parsed_gnps[0].inbound_rules[0];
        assert_eq!(parsed.src_hep_uuids, vec![dual.uuid.clone()]);
        assert!(parsed.src_gns_uuids.is_empty());

        let mut rule = from_selector("tier == 'nope' || has(v4only)");
        rule.ip_version = IpVersion::V6;
        let catalog = Catalog {
            host_endpoints: vec![make_hep("h", &[("v4only", "")], &["10.0.0.7"])],
            policies: vec![make_gnp("p", Some(1), "", vec![rule])],
            network_sets: vec![],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        let parsed = &resolution.policy.parsed_gnps[0].inbound_rules[0];
        assert_eq!(parsed.src_gns_uuids, vec![GNS_V6_EMPTY_UUID.to_string()]);
    }

    #[test]
    fn negated_fields_and_protocol_forms() {
        let rule = GnpRule {
            action: RuleAction::Deny,
            not_protocol: Some(Protocol::Name("UDP".to_string())),
            source: Some(RuleEntity {
                not_nets: vec!["10.0.0.0/8".to_string()],
                ports: vec![PortSpec::Number(53)],
                ..Default::default()
            }),
            destination: Some(RuleEntity {
                nets: vec!["192.168.0.0/16".to_string()],
                not_ports: vec![PortSpec::Range(1000, 2000), PortSpec::Number(22)],
                ..Default::default()
            }),
            ..Default::default()
        };
        let numbered = GnpRule {
            protocol: Some(Protocol::Number(6)),
            ..Default::default()
        };
        let catalog = Catalog {
            host_endpoints: vec![],
            policies: vec![make_gnp("p", Some(1), "", vec![rule, numbered])],
            network_sets: vec![],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        let rules = &resolution.policy.parsed_gnps[0].inbound_rules;

        assert_eq!(rules[0].action, "deny");
        assert_eq!(rules[0].protocol, "udp");
        assert!(rules[0].is_protocol_negative);
        assert_eq!(rules[0].src_nets, vec!["10.0.0.0/8"]);
        assert!(rules[0].is_src_net_negative);
        assert_eq!(rules[0].src_ports, vec!["53"]);
        assert!(!rules[0].is_src_port_negative);
        assert_eq!(rules[0].dst_nets, vec!["192.168.0.0/16"]);
        assert!(!rules[0].is_dst_net_negative);
        assert_eq!(rules[0].dst_ports, vec!["1000:2000", "22"]);
        assert!(rules[0].is_dst_port_negative);

        assert_eq!(rules[1].protocol, "6");
        assert!(!rules[1].is_protocol_negative);
        assert!(rules[1].src_nets.is_empty());
    }

    #[test]
    fn ingress_precedes_egress_and_rule_order_is_kept() {
        let mut gnp = make_gnp(
            "p",
            Some(1),
            "",
            vec![
                GnpRule {
                    action: RuleAction::Log,
                    ..Default::default()
                },
                GnpRule {
                    action: RuleAction::Pass,
                    ..Default::default()
                },
            ],
        );
        gnp.spec.egress = vec![GnpRule {
            action: RuleAction::Deny,
            ..Default::default()
        }];
        let catalog = Catalog {
            host_endpoints: vec![],
            policies: vec![gnp],
            network_sets: vec![],
        };
        let resolution = Resolver::new(&catalog).resolve(&target());
        let parsed = &resolution.policy.parsed_gnps[0];
        let inbound: Vec<&str> = parsed.inbound_rules.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(inbound, vec!["log", "pass"]);
        assert_eq!(parsed.outbound_rules[0].action, "deny");
    }

    #[test]
    fn resolution_is_idempotent() {
        let catalog = Catalog {
            host_endpoints: vec![
                target(),
                make_hep("db-1", &[("role", "db")], &["10.0.1.1"]),
                make_hep("db-2", &[("role", "db")], &["10.0.1.2"]),
            ],
            policies: vec![
                make_gnp("x", None, "", vec![from_selector("role == 'db'")]),
                make_gnp("y", Some(4), "role == 'web'", vec![from_selector("has(missing)")]),
            ],
            network_sets: vec![make_gns("office", &[("role", "db")], &["192.168.0.0/16"])],
        };
        let first = Resolver::new(&catalog).resolve(&target());
        let second = Resolver::new(&catalog).resolve(&target());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.policy).unwrap(),
            serde_json::to_string(&second.policy).unwrap()
        );
    }

    #[test]
    fn resolve_all_builds_independent_bundles() {
        let db = make_hep("db-1", &[("role", "db")], &["10.0.1.1"]);
        let catalog = Catalog {
            host_endpoints: vec![target(), db.clone()],
            policies: vec![
                make_gnp("web", Some(1), "role == 'web'", vec![from_selector("role == 'db'")]),
                make_gnp("db", Some(2), "role == 'db'", vec![from_selector("role == 'db'")]),
            ],
            network_sets: vec![],
        };
        let all = Resolver::new(&catalog).resolve_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].policy.hep.metadata.name, "web-1");
        assert_eq!(names(&all[0]), vec!["web"]);
        assert_eq!(all[1].policy.hep.metadata.name, "db-1");
        assert_eq!(names(&all[1]), vec!["db"]);
        // each bundle records the shared HEP on its own
        assert_eq!(all[0].policy.parsed_heps.len(), 1);
        assert_eq!(all[1].policy.parsed_heps.len(), 1);
        assert_eq!(all[1].policy.parsed_heps[0].uuid, db.uuid);
    }
}
