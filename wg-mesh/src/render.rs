// Peer configuration rendering

//! Peer configuration rendering
//!
//! Turns a resolved topology into the text of one WireGuard configuration
//! file. Rendering is pure: the same topology, target and timestamp always
//! produce the same text, and nothing is written anywhere.
//!
//! Layout guarantees:
//! - `[Interface]` and `[Peer]` headers start at the beginning of a line
//! - every field is a single `Key = value` line
//! - fields without a value are left out entirely

use crate::allowed::resolve_allowed_addresses;
use crate::error::Result;
use crate::topology::{Peer, Topology};
use crate::visibility::visible_peers;
use chrono::{DateTime, TimeZone};
use std::fmt;

/// Tool name written into the generated header
const GENERATOR: &str = "wg-mesh";

/// Accumulates sections, dropping empty fields
struct ConfigWriter {
    out: String,
}

impl ConfigWriter {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn comment(&mut self, text: impl fmt::Display) {
        self.out.push_str(&format!("# {}\n", text));
    }

    fn section(&mut self, name: &str) {
        self.out.push_str(&format!("[{}]\n", name));
    }

    fn field(&mut self, key: &str, value: impl fmt::Display) {
        let value = value.to_string();
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.out.push_str(&format!("{} = {}\n", key, value));
    }

    /// Numeric field where 0 means unset
    fn number(&mut self, key: &str, value: u16) {
        if value != 0 {
            self.field(key, value);
        }
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Render the configuration file of `target_id`.
///
/// The file holds an `[Interface]` block for the target followed by one
/// `[Peer]` block per visible peer, in declaration order.
///
/// # Errors
///
/// Returns `NotFound` if `target_id` is not declared, or a validation error
/// (scoped to the network) if an address range cannot be parsed.
pub fn render_peer_config<Tz>(
    topology: &Topology,
    target_id: &str,
    generated_at: &DateTime<Tz>,
) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let network_id = &topology.network().id;
    let target = topology.require_peer(target_id)?;
    let remotes = visible_peers(topology, target_id)?;

    log::debug!(
        "{}/{}: visible peers [{}]",
        network_id,
        target.id,
        remotes
            .iter()
            .map(|p| p.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut w = ConfigWriter::new();
    w.comment(format_args!(
        "Generated by {} at {}",
        GENERATOR,
        generated_at.format("%Y-%m-%d %H:%M:%S %:z")
    ));
    w.comment(format_args!("Network = {}", network_id));
    w.blank();

    write_interface(&mut w, target);

    for remote in remotes {
        let allowed = peer_allowed_ips(topology, remote, target)
            .map_err(|e| e.in_network(network_id))?;
        log::debug!(
            "{}/{}: AllowedIPs for {} = {}",
            network_id,
            target.id,
            remote.id,
            allowed
        );

        w.blank();
        w.comment(format_args!("ID = {}", remote.id));
        if remote.is_relay() {
            w.comment("Relay");
        }
        w.section("Peer");
        w.field("PublicKey", &remote.public_key);
        if remote.is_relay() {
            w.field("Endpoint", &remote.endpoint);
        }
        w.field("AllowedIPs", &allowed);
        // How often this interface pings out is the target's own setting
        w.number("PersistentKeepalive", target.persistent_keepalive);
    }

    Ok(w.finish())
}

fn write_interface(w: &mut ConfigWriter, target: &Peer) {
    w.comment(format_args!("ID = {}", target.id));
    w.section("Interface");
    w.field("PrivateKey", &target.private_key);
    w.field("Address", &target.address);
    w.number("ListenPort", target.listen_port);
    w.field("DNS", &target.dns);
    w.number("MTU", target.mtu);
    w.number("PersistentKeepalive", target.persistent_keepalive);

    if target.is_relay() && target.is_linux() {
        for (key, command) in forwarding_rules(&target.public_interface) {
            w.field(key, command);
        }
    }
}

/// PostUp/PostDown commands that let a Linux relay forward and masquerade
fn forwarding_rules(public_interface: &str) -> [(&'static str, String); 3] {
    let rules = |op: &str| {
        format!(
            "iptables -{op} FORWARD -i %i -j ACCEPT; \
             iptables -{op} FORWARD -o %i -j ACCEPT; \
             iptables -t nat -{op} POSTROUTING -o {public_interface} -j MASQUERADE"
        )
    };
    [
        ("PostUp", "sysctl -q -w net.ipv4.ip_forward=1".to_string()),
        ("PostUp", rules("A")),
        ("PostDown", rules("D")),
    ]
}

/// AllowedIPs line for `remote` as seen from `target`.
///
/// Relays also carry the network subnet so clients reach the whole mesh
/// through them.
fn peer_allowed_ips(topology: &Topology, remote: &Peer, target: &Peer) -> Result<String> {
    let mut allowed = resolve_allowed_addresses(remote, target)?;

    let subnet = topology.network().subnet.trim();
    if remote.is_relay() && !subnet.is_empty() && !allowed.iter().any(|r| r == subnet) {
        allowed.push(subnet.to_string());
    }

    Ok(allowed.join(","))
}
