//! Network operators

use ipnetwork::IpNetwork;
use serde_json::Value;
use std::net::IpAddr;
use tracing::debug;

use super::{expected_items, to_bool};

fn parse_ip(value: &Value) -> Option<IpAddr> {
    value.as_str()?.trim().parse().ok()
}

/// Whether `ip` falls in `range`; a range without `/` is an exact address
///
/// `None` when the range does not parse.
fn in_range(ip: IpAddr, range: &str) -> Option<bool> {
    let range = range.trim();
    if range.contains('/') {
        range.parse::<IpNetwork>().ok().map(|network| network.contains(ip))
    } else {
        range.parse::<IpAddr>().ok().map(|addr| addr == ip)
    }
}

/// Membership of `ip` in each listed range; `None` if any entry is malformed
fn memberships(ip: IpAddr, expected: &Value) -> Option<Vec<bool>> {
    expected_items(expected)
        .into_iter()
        .map(|range| in_range(ip, range.as_str()?))
        .collect()
}

/// `IPInRange`: one CIDR or a list of CIDRs/addresses
pub fn in_any_range(actual: &Value, expected: &Value) -> bool {
    let Some(ip) = parse_ip(actual) else {
        return false;
    };
    memberships(ip, expected).is_some_and(|found| found.contains(&true))
}

/// `IPNotInRange`: a valid address outside every listed range
///
/// A malformed range makes the whole predicate false.
pub fn outside_all_ranges(actual: &Value, expected: &Value) -> bool {
    let Some(ip) = parse_ip(actual) else {
        return false;
    };
    match memberships(ip, expected) {
        Some(found) => !found.is_empty() && !found.contains(&true),
        None => {
            debug!("IPNotInRange with malformed range list {}", expected);
            false
        }
    }
}

/// Private, loopback, link-local or unique-local address
pub fn is_internal(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_internal(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}

/// `IsInternalIP`: compares internal-ness of the actual address with the expected bool
pub fn internal_equals(actual: &Value, expected: &Value) -> bool {
    match (parse_ip(actual), to_bool(expected)) {
        (Some(ip), Some(want)) => is_internal(ip) == want,
        _ => false,
    }
}
