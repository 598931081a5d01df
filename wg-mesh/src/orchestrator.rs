// Writes rendered peer configurations to disk

//! Network orchestration
//!
//! Renders every peer of a network and writes each result to
//! `<peers dir>/<peer ID>/wg-<network ID>.conf`. The first failing peer
//! aborts the network; other networks are unaffected.

use crate::error::{Error, Result};
use crate::loader::{load_topology_file, LoadOptions};
use crate::render::render_peer_config;
use crate::topology::Topology;
use chrono::{DateTime, TimeZone};
use std::fmt;
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

/// Prefix of the WireGuard interface (and file) name
pub const INTERFACE_PREFIX: &str = "wg-";

/// Extension of network description and peer configuration files
pub const CONF_EXTENSION: &str = "conf";

/// Peer directories hold private keys
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// File name of the configuration for `network_id`, e.g. `wg-office.conf`
pub fn config_file_name(network_id: &str) -> String {
    format!("{}{}.{}", INTERFACE_PREFIX, network_id, CONF_EXTENSION)
}

/// Render every peer of `topology` into `peers_dir`.
///
/// Returns the written paths in peer declaration order.
///
/// # Errors
///
/// Fails on the first peer whose configuration cannot be rendered or
/// written; files already written for earlier peers are left in place.
pub fn render_network<Tz>(
    topology: &Topology,
    peers_dir: &Path,
    generated_at: &DateTime<Tz>,
) -> Result<Vec<PathBuf>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let network_id = &topology.network().id;
    let file_name = config_file_name(network_id);
    let mut written = Vec::with_capacity(topology.peers().len());

    for peer in topology.peers() {
        log::info!("Rendering config for peer: {}", peer.id);

        let conf = render_peer_config(topology, &peer.id, generated_at)?;
        let dir = ensure_peer_dir(peers_dir, &peer.id).map_err(|e| e.in_network(network_id))?;
        let path = dir.join(&file_name);
        write_config(&path, &conf).map_err(|e| Error::io(&path, e).in_network(network_id))?;

        log::debug!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// Load and render every network description in `files`.
///
/// Networks are independent: a failure is reported in that network's slot
/// and the remaining files are still processed. Results keep the order of
/// `files`.
pub fn render_networks<Tz>(
    files: &[PathBuf],
    peers_dir: &Path,
    options: &LoadOptions,
    generated_at: &DateTime<Tz>,
) -> Vec<(PathBuf, Result<Vec<PathBuf>>)>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    files
        .iter()
        .map(|path| {
            let result = load_topology_file(path, options).and_then(|topology| {
                log::info!(
                    "==== Found {} peer(s) in network {} ====",
                    topology.peers().len(),
                    topology.network().id
                );
                render_network(&topology, peers_dir, generated_at)
            });
            (path.clone(), result)
        })
        .collect()
}

/// Make sure `<peers_dir>/<peer_id>` exists
fn ensure_peer_dir(peers_dir: &Path, peer_id: &str) -> Result<PathBuf> {
    let dir = peers_dir.join(peer_id);
    match fs::metadata(&dir) {
        Ok(meta) if meta.is_dir() => return Ok(dir),
        Ok(_) => {
            return Err(Error::io(
                &dir,
                io::Error::new(io::ErrorKind::AlreadyExists, "exists and is not a directory"),
            ))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::io(&dir, e)),
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(&dir).map_err(|e| Error::io(&dir, e))?;
    Ok(dir)
}

/// Create or truncate `path` and write `conf` into it
fn write_config(path: &Path, conf: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);

    let mut file = options.open(path)?;
    file.write_all(conf.as_bytes())?;
    file.flush()
}

/// Network description files (`*.conf`) in `dir`, sorted by name
pub fn discover_network_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let is_file = entry
            .file_type()
            .map_err(|e| Error::io(&path, e))?
            .is_file();
        if is_file && path.extension().is_some_and(|ext| ext == CONF_EXTENSION) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Remove `dir` and everything below it. A missing directory is fine.
pub fn clean_peers_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(dir, e)),
    }
}
