//! Peer visibility
//!
//! A relay forwards traffic for everyone, so it must know every other peer.
//! A client only ever talks through relays, so it only needs the relays.
//! Two clients never list each other.

use crate::error::Result;
use crate::topology::{Peer, Topology};

/// Peers that must appear in the configuration of `target_id`.
///
/// Declaration order is preserved and the target itself is excluded.
///
/// # Errors
///
/// Returns `NotFound` if the network does not declare `target_id`.
pub fn visible_peers<'a>(topology: &'a Topology, target_id: &str) -> Result<Vec<&'a Peer>> {
    let target = topology.require_peer(target_id)?;
    let target_is_relay = target.is_relay();

    Ok(topology
        .peers()
        .iter()
        .filter(|p| p.id != target.id)
        .filter(|p| target_is_relay || p.is_relay())
        .collect())
}
