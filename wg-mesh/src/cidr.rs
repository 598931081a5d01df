// CIDR helpers

//! CIDR parsing and containment testing
//!
//! Values stay as strings in the topology so they can be echoed back
//! verbatim into rendered files; these helpers parse them on demand.

use crate::error::{Error, Result};
use ipnet::IpNet;
use std::net::IpAddr;

/// Parse a CIDR block such as `10.1.1.0/24` or `fd00::/64`.
///
/// Host bits are allowed (`10.1.1.7/24` parses). A bare address without a
/// prefix length is rejected.
pub fn parse_cidr(cidr: &str) -> Result<IpNet> {
    cidr.trim()
        .parse::<IpNet>()
        .map_err(|e| Error::InvalidCidr {
            value: cidr.to_string(),
            reason: e.to_string(),
        })
}

/// Masked network address of a CIDR block
pub fn network_address(cidr: &str) -> Result<IpAddr> {
    Ok(parse_cidr(cidr)?.network())
}

/// Split a comma separated list, dropping empty entries and whitespace
pub fn split_list(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Check whether `ip` lies inside any of `subnets`.
///
/// Empty entries are skipped. A malformed subnet is an error even if
/// another entry matches.
pub fn ip_in_subnets<S: AsRef<str>>(ip: IpAddr, subnets: &[S]) -> Result<bool> {
    let mut found = false;
    for subnet in subnets {
        let subnet = subnet.as_ref();
        if subnet.trim().is_empty() {
            continue;
        }
        if parse_cidr(subnet)?.contains(&ip) {
            found = true;
        }
    }
    Ok(found)
}
