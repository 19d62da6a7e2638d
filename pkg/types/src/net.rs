//! Address parsing and write-time family splitting.

use ipnet::IpNet;
use std::net::IpAddr;
use tracing::warn;

use crate::metadata::IpVersion;

/// Parse a CIDR (`10.0.0.0/8`) or bare address (`10.0.0.1`).
/// Returns the address as written and the enclosing network.
pub fn parse_cidr_or_ip(s: &str) -> Option<(IpAddr, IpNet)> {
    if let Ok(net) = s.parse::<IpNet>() {
        return Some((net.addr(), net.trunc()));
    }
    s.parse::<IpAddr>().ok().map(|ip| (ip, IpNet::from(ip)))
}

/// Canonical network string for `s`. A CIDR carrying host bits collapses
/// to that single host (`10.0.0.5/24` becomes `10.0.0.5/32`).
pub fn normalize_net(s: &str) -> Option<(IpVersion, String)> {
    let (ip, net) = parse_cidr_or_ip(s)?;
    let canonical = if ip == net.network() {
        net
    } else {
        IpNet::from(ip)
    };
    Some((IpVersion::of(&ip), canonical.to_string()))
}

/// Whether `s` names a network address (no host bits set).
pub fn is_network_address(s: &str) -> bool {
    parse_cidr_or_ip(s).is_some_and(|(ip, net)| ip == net.network())
}

/// Split declared networks into normalised IPv4 and IPv6 lists.
/// Malformed entries are skipped with a warning.
pub fn split_nets(nets: &[String]) -> (Vec<String>, Vec<String>) {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    for raw in nets {
        match normalize_net(raw) {
            Some((IpVersion::V4, net)) => v4.push(net),
            Some((IpVersion::V6, net)) => v6.push(net),
            None => warn!(net = %raw, "malformed net"),
        }
    }
    (v4, v6)
}

/// Split host addresses into IPv4 and IPv6 lists, in canonical text form.
/// Malformed entries are skipped with a warning.
pub fn split_ips(ips: &[String]) -> (Vec<String>, Vec<String>) {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    for raw in ips {
        match raw.parse::<IpAddr>() {
            Ok(ip @ IpAddr::V4(_)) => v4.push(ip.to_string()),
            Ok(ip @ IpAddr::V6(_)) => v6.push(ip.to_string()),
            Err(_) => warn!(ip = %raw, "malformed ip"),
        }
    }
    (v4, v6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_variants() {
        assert_eq!(
            normalize_net("10.0.0.0/8"),
            Some((IpVersion::V4, "10.0.0.0/8".to_string()))
        );
        assert_eq!(
            normalize_net("10.0.0.5/24"),
            Some((IpVersion::V4, "10.0.0.5/32".to_string()))
        );
        assert_eq!(
            normalize_net("2001:db8::1"),
            Some((IpVersion::V6, "2001:db8::1/128".to_string()))
        );
        assert_eq!(normalize_net("10.0.0.0/33"), None);
        assert_eq!(normalize_net(""), None);
    }

    #[test]
    fn network_address_check() {
        assert!(is_network_address("192.168.0.0/16"));
        assert!(is_network_address("192.168.3.4"));
        assert!(!is_network_address("192.168.3.4/16"));
        assert!(!is_network_address("nope"));
    }

    #[test]
    fn split_ips_canonicalizes() {
        let (v4, v6) = split_ips(&["2001:0db8:0000::0001".to_string(), "1.2.3.4".to_string()]);
        assert_eq!(v4, vec!["1.2.3.4"]);
        assert_eq!(v6, vec!["2001:db8::1"]);
    }
}
