// Network description loader

//! Network description loading
//!
//! A network is described in an INI file with one `[Network]` section and
//! one `[Peer]` section per peer:
//!
//! ```ini
//! [Network]
//! ID = example
//! Subnet = 192.168.25.0/24
//!
//! [Peer]
//! ID = Pata
//! Address = 192.168.25.1/32
//! Endpoint = pata.example.com:49736
//! PublicInterface = eth0
//! ```
//!
//! Parsing behaviour is controlled by an explicit [`LoadOptions`] value
//! rather than global parser state.

use crate::cidr::split_list;
use crate::error::{Error, Result};
use crate::topology::{Network, Peer, Topology};
use ini::{Ini, ParseOption, Properties};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const SECTION_NETWORK: &str = "Network";
const SECTION_PEER: &str = "Peer";

const NETWORK_KEYS: &[&str] = &["ID", "Subnet"];

const PEER_KEYS: &[&str] = &[
    "ID",
    "Address",
    "AllowedIPs",
    "LocalSubnets",
    "Endpoint",
    "PublicKey",
    "PrivateKey",
    "ListenPort",
    "PersistentKeepalive",
    "DNS",
    "MTU",
    "PublicInterface",
    "OS",
];

/// Options for reading network description files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Match section and key names ignoring ASCII case
    pub case_insensitive: bool,
    /// Accept a key repeated within one section. List keys accumulate,
    /// scalar keys keep the last value.
    pub allow_shadowed_keys: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            allow_shadowed_keys: true,
        }
    }
}

impl LoadOptions {
    fn name_matches(&self, found: &str, expected: &str) -> bool {
        if self.case_insensitive {
            found.eq_ignore_ascii_case(expected)
        } else {
            found == expected
        }
    }

    /// Canonical spelling of `found` among `known`
    fn canonical(&self, found: &str, known: &[&'static str]) -> Option<&'static str> {
        known
            .iter()
            .copied()
            .find(|k| self.name_matches(found.trim(), k))
    }
}

/// Load a topology from a network description file
pub fn load_topology_file<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Topology> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    load_topology_str(&contents, &path.display().to_string(), options)
}

/// Load a topology from network description text.
///
/// `origin` names the source in error messages.
pub fn load_topology_str(contents: &str, origin: &str, options: &LoadOptions) -> Result<Topology> {
    let parse_error = |message: String| Error::Parse {
        origin: origin.to_string(),
        message,
    };

    let parsed = Ini::load_from_str_opt(
        contents,
        ParseOption {
            enabled_escape: false,
            ..ParseOption::default()
        },
    )
    .map_err(|e| parse_error(e.to_string()))?;

    let mut network: Option<Network> = None;
    let mut peers = Vec::new();

    for (name, props) in parsed.iter() {
        let Some(name) = name else {
            if let Some((key, _)) = props.iter().next() {
                return Err(parse_error(format!("key '{}' outside of any section", key)));
            }
            continue;
        };

        if options.name_matches(name.trim(), SECTION_NETWORK) {
            if network.is_some() {
                return Err(parse_error(format!(
                    "section [{}] declared more than once",
                    SECTION_NETWORK
                )));
            }
            network = Some(read_network(props, options).map_err(parse_error)?);
        } else if options.name_matches(name.trim(), SECTION_PEER) {
            let peer = read_peer(props, options)
                .map_err(|e| parse_error(format!("peer #{}: {}", peers.len() + 1, e)))?;
            peers.push(peer);
        } else {
            return Err(parse_error(format!("unknown section [{}]", name)));
        }
    }

    let network = network
        .ok_or_else(|| parse_error(format!("missing [{}] section", SECTION_NETWORK)))?;
    log::debug!(
        "{}: network '{}' with {} peer(s)",
        origin,
        network.id,
        peers.len()
    );
    Topology::new(network, peers)
}

/// Yields `(canonical key, value)` for each entry, enforcing the shadowing rule
fn entries<'a>(
    props: &'a Properties,
    known: &[&'static str],
    options: &LoadOptions,
) -> std::result::Result<Vec<(&'static str, &'a str)>, String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (key, value) in props.iter() {
        let canonical = options
            .canonical(key, known)
            .ok_or_else(|| format!("unknown key '{}'", key))?;
        if !seen.insert(canonical) && !options.allow_shadowed_keys {
            return Err(format!("key '{}' declared more than once", canonical));
        }
        out.push((canonical, value.trim()));
    }
    Ok(out)
}

fn read_network(props: &Properties, options: &LoadOptions) -> std::result::Result<Network, String> {
    let mut network = Network::default();
    for (key, value) in entries(props, NETWORK_KEYS, options)? {
        match key {
            "ID" => network.id = value.to_string(),
            "Subnet" => network.subnet = value.to_string(),
            other => return Err(format!("unsupported key '{}'", other)),
        }
    }
    Ok(network)
}

fn read_peer(props: &Properties, options: &LoadOptions) -> std::result::Result<Peer, String> {
    let mut peer = Peer::default();
    for (key, value) in entries(props, PEER_KEYS, options)? {
        match key {
            "ID" => peer.id = value.to_string(),
            "Address" => peer.address = value.to_string(),
            "AllowedIPs" => peer
                .allowed_ips
                .extend(split_list(value).into_iter().map(String::from)),
            "LocalSubnets" => peer
                .local_subnets
                .extend(split_list(value).into_iter().map(String::from)),
            "Endpoint" => peer.endpoint = value.to_string(),
            "PublicKey" => peer.public_key = value.to_string(),
            "PrivateKey" => peer.private_key = value.to_string(),
            "ListenPort" => peer.listen_port = parse_number(key, value)?,
            "PersistentKeepalive" => peer.persistent_keepalive = parse_number(key, value)?,
            "DNS" => peer.dns = value.to_string(),
            "MTU" => peer.mtu = parse_number(key, value)?,
            "PublicInterface" => peer.public_interface = value.to_string(),
            "OS" => peer.os = value.to_string(),
            other => return Err(format!("unsupported key '{}'", other)),
        }
    }
    Ok(peer)
}

/// Empty means unset (0)
fn parse_number(key: &str, value: &str) -> std::result::Result<u16, String> {
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .map_err(|_| format!("{} must be a number in 0-65535, got '{}'", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example::EXAMPLE_NETWORK;
    use std::io::Write;

    fn load(text: &str) -> Result<Topology> {
        load_topology_str(text, "test", &LoadOptions::default())
    }

    #[test]
    fn test_example_maps_to_topology() {
        let topology = load(EXAMPLE_NETWORK).unwrap();

        assert_eq!(topology.network().id, "example");
        assert_eq!(topology.network().subnet, "192.168.25.0/24");
        assert_eq!(topology.peers().len(), 3);

        let tento = &topology.peers()[0];
        assert_eq!(tento.id, "Tento");
        assert_eq!(tento.address, "192.168.25.55/32");
        assert_eq!(tento.private_key, "private-key-of-tento");
        assert_eq!(tento.public_key, "public-key-of-tento");
        assert_eq!(tento.persistent_keepalive, 25);
        assert!(!tento.is_relay());

        let pata = &topology.peers()[1];
        assert_eq!(pata.id, "Pata");
        assert_eq!(pata.address, "192.168.25.1/32");
        assert_eq!(pata.listen_port, 49736);
        assert_eq!(pata.endpoint, "pata.example.com:49736");
        assert_eq!(pata.allowed_ips, vec!["10.1.1.0/24"]);
        assert_eq!(pata.public_interface, "eth0");
        assert_eq!(pata.os, "Linux");
        assert!(pata.is_relay());

        let agu = &topology.peers()[2];
        assert_eq!(agu.id, "Agu");
        assert_eq!(agu.local_subnets, vec!["192.168.1.0/24"]);
        assert_eq!(agu.persistent_keepalive, 5);
    }

    #[test]
    fn test_case_insensitive_names() {
        let text = "[network]\nid = lower\n\n[PEER]\nid = a\nallowedips = 10.0.0.0/8, 20.0.0.0/8\n";
        let topology = load(text).unwrap();
        assert_eq!(topology.network().id, "lower");
        assert_eq!(topology.peers()[0].allowed_ips, vec!["10.0.0.0/8", "20.0.0.0/8"]);

        let strict = LoadOptions {
            case_insensitive: false,
            ..LoadOptions::default()
        };
        let err = load_topology_str(text, "test", &strict).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_shadowed_keys() {
        let text = "[Network]\nID = n\n\n[Peer]\nID = a\nAllowedIPs = 10.0.0.0/8\nAllowedIPs = 20.0.0.0/8\nOS = FreeBSD\nOS = Linux\n";
        let topology = load(text).unwrap();
        let peer = &topology.peers()[0];
        assert_eq!(peer.allowed_ips, vec!["10.0.0.0/8", "20.0.0.0/8"]);
        assert_eq!(peer.os, "Linux");

        let strict = LoadOptions {
            allow_shadowed_keys: false,
            ..LoadOptions::default()
        };
        let err = load_topology_str(text, "test", &strict).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_quoted_values() {
        let topology = load("[Network]\nID = \"quoted\"\n").unwrap();
        assert_eq!(topology.network().id, "quoted");
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            load("[Peer]\nID = a\n").unwrap_err(),
            Error::Parse { .. }
        ));
        assert!(matches!(
            load("[Network]\nID = a\n[Network]\nID = b\n").unwrap_err(),
            Error::Parse { .. }
        ));
        assert!(matches!(
            load("[Network]\nID = a\n[Interface]\nMTU = 1\n").unwrap_err(),
            Error::Parse { .. }
        ));
        assert!(matches!(
            load("[Network]\nID = a\nColour = blue\n").unwrap_err(),
            Error::Parse { .. }
        ));

        let err = load("[Network]\nID = a\n[Peer]\nID = b\nListenPort = lots\n").unwrap_err();
        assert!(err.to_string().contains("ListenPort"));
        assert!(err.to_string().contains("peer #1"));
    }

    #[test]
    fn test_validation_after_mapping() {
        let err = load("[Network]\nID = a\n[Peer]\nID = b\nAddress = 10.0.0.1\n").unwrap_err();
        assert!(err.is_validation());

        let err = load("[Network]\nID = a\n[Peer]\nID = b\n[Peer]\nID = b\n").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE_NETWORK.as_bytes()).unwrap();

        let topology = load_topology_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(topology.peers().len(), 3);

        let err = load_topology_file("/nonexistent/net.conf", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
