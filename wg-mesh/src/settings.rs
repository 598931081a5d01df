// Tool settings file parser

//! Tool settings
//!
//! Optional TOML file with defaults for the command line. Every field has a
//! default, so an empty or missing file is valid.
//!
//! ```toml
//! [general]
//! log_level = "debug"
//! networks_dir = "networks"
//! peers_dir = "peers"
//!
//! [loader]
//! case_insensitive = true
//! allow_shadowed_keys = false
//! ```

use crate::loader::LoadOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Accepted values for `general.log_level`
const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Main settings structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// General options
    #[serde(default)]
    pub general: GeneralSettings,
    /// Network description parsing options
    #[serde(default)]
    pub loader: LoaderSettings,
}

/// General options
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralSettings {
    /// Default log filter
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory scanned for network descriptions
    #[serde(default = "default_networks_dir")]
    pub networks_dir: PathBuf,
    /// Directory receiving per-peer configurations
    #[serde(default = "default_peers_dir")]
    pub peers_dir: PathBuf,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            networks_dir: default_networks_dir(),
            peers_dir: default_peers_dir(),
        }
    }
}

/// Network description parsing options
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoaderSettings {
    /// Match section and key names ignoring case
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
    /// Accept repeated keys within a section
    #[serde(default = "default_true")]
    pub allow_shadowed_keys: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            allow_shadowed_keys: true,
        }
    }
}

impl From<LoaderSettings> for LoadOptions {
    fn from(s: LoaderSettings) -> Self {
        LoadOptions {
            case_insensitive: s.case_insensitive,
            allow_shadowed_keys: s.allow_shadowed_keys,
        }
    }
}

// Default values for settings
fn default_log_level() -> String {
    "info".to_string()
}

fn default_networks_dir() -> PathBuf {
    PathBuf::from(crate::example::NETWORKS_DIR)
}

fn default_peers_dir() -> PathBuf {
    PathBuf::from("peers")
}

fn default_true() -> bool {
    true
}

/// Load settings from a TOML file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = fs::read_to_string(path.as_ref()).context("Failed to read settings file")?;
    parse_settings(&contents)
}

/// Load settings if the file exists, defaults otherwise
pub fn load_settings_or_default<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if path.exists() {
        load_settings(path).with_context(|| format!("Failed to load settings from {:?}", path))
    } else {
        Ok(Settings::default())
    }
}

fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).context("Failed to parse settings file")?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Validate settings values
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_log_level(&settings.general.log_level)?;

    if settings.general.networks_dir.as_os_str().is_empty() {
        anyhow::bail!("networks_dir cannot be empty");
    }

    if settings.general.peers_dir.as_os_str().is_empty() {
        anyhow::bail!("peers_dir cannot be empty");
    }

    Ok(())
}

/// Check a log level name
pub fn validate_log_level(level: &str) -> Result<()> {
    if !LOG_LEVELS.iter().any(|l| l.eq_ignore_ascii_case(level)) {
        anyhow::bail!(
            "Invalid log level '{}', expected one of: {}",
            level,
            LOG_LEVELS.join(", ")
        );
    }
    Ok(())
}
