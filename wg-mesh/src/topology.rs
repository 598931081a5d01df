// In-memory network model

//! Topology model
//!
//! A [`Topology`] is one network identity plus its peers in declaration
//! order. It is validated once in [`Topology::new`] and never mutated
//! afterwards, so it can be shared freely between threads while peer
//! configurations are resolved.

use crate::cidr;
use crate::error::{Error, Result};
use std::collections::HashSet;

/// Operating system tag that enables Linux forwarding rules
pub const OS_LINUX: &str = "Linux";

/// Network identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Network {
    /// Identifier, used as the suffix of the interface name
    pub id: String,
    /// Subnet containing all peer addresses (CIDR, may be empty)
    pub subnet: String,
}

/// A peer of the mesh
///
/// Holds both the local interface settings and the settings other peers
/// need to reach it, plus the relay-related extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Peer {
    /// Unique identifier within the network
    pub id: String,
    /// The peer's own tunnel address (CIDR, may be empty)
    pub address: String,
    /// Ranges this peer is willing to route for others
    pub allowed_ips: Vec<String>,
    /// Ranges this peer already reaches without the tunnel
    pub local_subnets: Vec<String>,
    /// Publicly reachable `host:port`, empty for peers behind NAT
    pub endpoint: String,
    /// WireGuard public key
    pub public_key: String,
    /// WireGuard private key
    pub private_key: String,
    /// UDP listen port, 0 = unset
    pub listen_port: u16,
    /// Keepalive interval in seconds, 0 = disabled
    pub persistent_keepalive: u16,
    /// DNS servers for the interface
    pub dns: String,
    /// Interface MTU, 0 = unset
    pub mtu: u16,
    /// Outward-facing interface of a relay
    pub public_interface: String,
    /// Operating system tag
    pub os: String,
}

impl Peer {
    /// Create a peer with only an identifier set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// True if the peer relays traffic for others (a bounce server).
    ///
    /// Requires both a public endpoint and an outward-facing interface.
    pub fn is_relay(&self) -> bool {
        !self.endpoint.is_empty() && !self.public_interface.is_empty()
    }

    /// True if the OS tag says Linux
    pub fn is_linux(&self) -> bool {
        self.os.eq_ignore_ascii_case(OS_LINUX)
    }

    fn subject(&self) -> String {
        format!("peer '{}'", self.id)
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation {
                subject: "peer".to_string(),
                field: "ID",
                value: self.id.clone(),
                reason: "peer ID cannot be empty".to_string(),
            });
        }

        if !self.address.is_empty() {
            cidr::parse_cidr(&self.address).map_err(|e| e.for_peer_field(&self.id, "Address"))?;
        }
        for range in &self.allowed_ips {
            cidr::parse_cidr(range).map_err(|e| e.for_peer_field(&self.id, "AllowedIPs"))?;
        }
        for subnet in &self.local_subnets {
            cidr::parse_cidr(subnet).map_err(|e| e.for_peer_field(&self.id, "LocalSubnets"))?;
        }

        if !self.endpoint.is_empty() {
            validate_endpoint(&self.endpoint).map_err(|reason| Error::Validation {
                subject: self.subject(),
                field: "Endpoint",
                value: self.endpoint.clone(),
                reason,
            })?;
        }

        Ok(())
    }
}

/// Check `host:port`, with IPv6 hosts in brackets
fn validate_endpoint(endpoint: &str) -> std::result::Result<(), String> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| "expected host:port".to_string())?;

    if host.is_empty() || host == "[]" {
        return Err("host cannot be empty".to_string());
    }
    if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
        return Err("IPv6 hosts must be enclosed in brackets".to_string());
    }
    if host.chars().any(char::is_whitespace) {
        return Err("host cannot contain whitespace".to_string());
    }

    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(format!("port '{}' must be a number in 1-65535", port)),
        Ok(_) => Ok(()),
    }
}

/// One network and its peers, in declaration order
#[derive(Debug, Clone)]
pub struct Topology {
    network: Network,
    peers: Vec<Peer>,
}

impl Topology {
    /// Build and validate a topology.
    ///
    /// # Errors
    ///
    /// Returns a validation error, scoped to the network, if the network ID
    /// is empty, any CIDR or endpoint is malformed, or peer IDs are empty or
    /// repeated.
    pub fn new(network: Network, peers: Vec<Peer>) -> Result<Self> {
        if network.id.trim().is_empty() {
            return Err(Error::Validation {
                subject: "network".to_string(),
                field: "ID",
                value: network.id,
                reason: "network ID cannot be empty".to_string(),
            });
        }

        let topology = Self { network, peers };
        topology
            .validate()
            .map_err(|e| e.in_network(&topology.network.id))?;
        Ok(topology)
    }

    fn validate(&self) -> Result<()> {
        if !self.network.subnet.is_empty() {
            cidr::parse_cidr(&self.network.subnet).map_err(|e| match e {
                Error::InvalidCidr { value, reason } => Error::Validation {
                    subject: format!("network '{}'", self.network.id),
                    field: "Subnet",
                    value,
                    reason,
                },
                other => other,
            })?;
        }

        let mut seen = HashSet::new();
        for peer in &self.peers {
            peer.validate()?;
            if !seen.insert(peer.id.as_str()) {
                return Err(Error::Validation {
                    subject: peer.subject(),
                    field: "ID",
                    value: peer.id.clone(),
                    reason: "peer ID is declared more than once".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Network identity
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// All peers in declaration order
    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Look up a peer by identifier
    pub fn peer(&self, id: &str) -> Option<&Peer> {
        self.peers.iter().find(|p| p.id == id)
    }

    /// Look up a peer, failing with `NotFound`
    pub fn require_peer(&self, id: &str) -> Result<&Peer> {
        self.peer(id).ok_or_else(|| Error::NotFound {
            network: self.network.id.clone(),
            peer: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> Network {
        Network {
            id: "example".to_string(),
            subnet: "192.168.25.0/24".to_string(),
        }
    }

    #[test]
    fn test_is_relay() {
        let empty = Peer::new("empty");

        let mut endpoint_only = Peer::new("endpoint");
        endpoint_only.endpoint = "something:1".to_string();

        let mut interface_only = Peer::new("interface");
        interface_only.public_interface = "eth0".to_string();

        let mut both = Peer::new("both");
        both.endpoint = "a:1".to_string();
        both.public_interface = "b".to_string();

        assert!(!empty.is_relay());
        assert!(!endpoint_only.is_relay());
        assert!(!interface_only.is_relay());
        assert!(both.is_relay());
    }

    #[test]
    fn test_is_linux() {
        let os = |tag: &str| Peer {
            os: tag.to_string(),
            ..Peer::new("p")
        };
        assert!(!Peer::new("p").is_linux());
        assert!(!os("iOS").is_linux());
        assert!(!os("FreeBSD").is_linux());
        assert!(os("Linux").is_linux());
        assert!(os("linux").is_linux());
    }

    #[test]
    fn test_lookup_preserves_order() {
        let topology = Topology::new(
            network(),
            vec![Peer::new("Tento"), Peer::new("Pata"), Peer::new("Agu")],
        )
        .unwrap();

        let ids: Vec<&str> = topology.peers().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["Tento", "Pata", "Agu"]);
        assert_eq!(topology.peer("Pata").unwrap().id, "Pata");
        assert!(topology.peer("Nobody").is_none());
        assert!(topology.require_peer("Nobody").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_peer_rejected() {
        let err = Topology::new(network(), vec![Peer::new("Tento"), Peer::new("Tento")])
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_empty_ids_rejected() {
        let err = Topology::new(Network::default(), vec![]).unwrap_err();
        assert!(err.is_validation());

        let err = Topology::new(network(), vec![Peer::new("")]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_malformed_cidr_rejected() {
        let mut peer = Peer::new("Pata");
        peer.allowed_ips = vec!["10.1.1.0/24".to_string(), "10.1.1/24".to_string()];
        let err = Topology::new(network(), vec![peer]).unwrap_err();

        let msg = err.to_string();
        assert!(err.is_validation());
        assert!(msg.contains("example"));
        assert!(msg.contains("Pata"));
        assert!(msg.contains("AllowedIPs"));
        assert!(msg.contains("10.1.1/24"));

        let mut peer = Peer::new("Agu");
        peer.address = "192.168.25.15".to_string();
        assert!(Topology::new(network(), vec![peer]).is_err());

        let mut bad_subnet = network();
        bad_subnet.subnet = "192.168.25.0/40".to_string();
        assert!(Topology::new(bad_subnet, vec![]).unwrap_err().is_validation());
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(validate_endpoint("pata.example.com:49736").is_ok());
        assert!(validate_endpoint("203.0.113.7:51820").is_ok());
        assert!(validate_endpoint("[2001:db8::1]:51820").is_ok());

        assert!(validate_endpoint("pata.example.com").is_err());
        assert!(validate_endpoint(":51820").is_err());
        assert!(validate_endpoint("host:0").is_err());
        assert!(validate_endpoint("host:70000").is_err());
        assert!(validate_endpoint("host:port").is_err());
        assert!(validate_endpoint("2001:db8::1:51820").is_err());

        let mut peer = Peer::new("Pata");
        peer.endpoint = "pata.example.com".to_string();
        let err = Topology::new(network(), vec![peer]).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Endpoint"));
    }

    #[test]
    fn test_topology_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Topology>();
    }
}
