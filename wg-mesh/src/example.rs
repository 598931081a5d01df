// Example network description and directory scaffolding

//! Example network description
//!
//! Written to `networks/example.conf` by `wg-mesh --example` as a starting
//! point for new networks.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding network description files
pub const NETWORKS_DIR: &str = "networks";

/// File name of the example network description
pub const EXAMPLE_FILE: &str = "example.conf";

/// Content of the example network description file
pub const EXAMPLE_NETWORK: &str = r#"# Example network description for wg-mesh.
#
# One file describes one network. wg-mesh writes a WireGuard configuration
# for every peer below into peers/<peer ID>/wg-<network ID>.conf, so each
# machine only needs WireGuard installed and its own file copied over.
#
# Settings are mandatory unless marked optional.

[Network]
# Suffix of the WireGuard interface name (wg-example).
ID = "example"
# Subnet holding every peer address. Relays route it for their clients.
Subnet = 192.168.25.0/24

# A [Peer] section combines the WireGuard [Interface] and [Peer] settings
# of one machine, plus a few wg-mesh extensions.

# A client peer behind NAT.
[Peer]
# Unique name of the peer.
ID = Tento
# Tunnel address of the peer.
Address = 192.168.25.55/32
# Generate a key pair with:
#   prik=$(wg genkey); pubk=$(echo "$prik" | wg pubkey)
PrivateKey = private-key-of-tento
PublicKey = public-key-of-tento
# Keepalive interval in seconds for peers behind NAT, optional.
PersistentKeepalive = 25


# A relay (bounce server) forwarding traffic between clients.
# A peer is a relay when it has both Endpoint and PublicInterface.
[Peer]
ID = Pata
Address = 192.168.25.1/32
PrivateKey = private-key-of-pata
PublicKey = public-key-of-pata
# Port to listen on, optional.
ListenPort = 49736
# Publicly reachable host:port. The port may differ from ListenPort.
Endpoint = pata.example.com:49736
# Extra ranges this relay can route for others, optional.
AllowedIPs = 10.1.1.0/24
# Interface facing the Internet, used for forwarding rules.
PublicInterface = eth0
# With OS = Linux the relay gets sysctl/iptables PostUp and PostDown rules, optional.
OS = Linux


# Another client behind NAT.
[Peer]
ID = Agu
Address = 192.168.25.15/32
# Subnets this peer already sits in. Ranges advertised by relays that fall
# inside them are not routed through the tunnel, optional.
LocalSubnets = 192.168.1.0/24
PrivateKey = private-key-of-agu
PublicKey = public-key-of-agu
PersistentKeepalive = 5
"#;

/// Create `<networks_dir>/example.conf`, returning its path
pub fn scaffold_example<P: AsRef<Path>>(networks_dir: P) -> Result<PathBuf> {
    let dir = networks_dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let path = dir.join(EXAMPLE_FILE);
    log::info!("Writing example network description to {}", path.display());
    fs::write(&path, EXAMPLE_NETWORK).map_err(|e| Error::io(&path, e))?;
    Ok(path)
}
