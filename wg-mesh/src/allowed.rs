// AllowedIPs computation

//! Allowed-address resolution
//!
//! Decides which ranges a viewer should route toward an advertiser. The
//! advertiser's own tunnel address always comes first. Each advertised
//! range follows unless its network address already lies inside a subnet
//! the viewer reaches directly (its local subnets or its own advertised
//! ranges), which would otherwise tunnel local traffic and break symmetry.
//!
//! Only the network address of an advertised range is tested. A range that
//! partially overlaps a local subnet, or strictly contains one, is kept.

use crate::cidr;
use crate::error::Result;
use crate::topology::Peer;

/// Ranges `viewer` should route toward `advertiser`, in first-seen order.
///
/// # Errors
///
/// Returns a validation error naming the peer and field if any range of
/// either peer is not valid CIDR.
pub fn resolve_allowed_addresses(advertiser: &Peer, viewer: &Peer) -> Result<Vec<String>> {
    let mut allowed = Vec::new();
    if !advertiser.address.trim().is_empty() {
        cidr::parse_cidr(&advertiser.address)
            .map_err(|e| e.for_peer_field(&advertiser.id, "Address"))?;
        allowed.push(advertiser.address.trim().to_string());
    }

    for range in &advertiser.allowed_ips {
        let range = range.trim();
        if range.is_empty() {
            continue;
        }

        let ip = cidr::network_address(range)
            .map_err(|e| e.for_peer_field(&advertiser.id, "AllowedIPs"))?;
        let in_local = cidr::ip_in_subnets(ip, &viewer.local_subnets)
            .map_err(|e| e.for_peer_field(&viewer.id, "LocalSubnets"))?;
        let in_advertised = cidr::ip_in_subnets(ip, &viewer.allowed_ips)
            .map_err(|e| e.for_peer_field(&viewer.id, "AllowedIPs"))?;

        if in_local || in_advertised {
            log::debug!(
                "{}: not routing {} to {}, already local",
                viewer.id,
                range,
                advertiser.id
            );
        } else {
            allowed.push(range.to_string());
        }
    }

    Ok(allowed)
}
