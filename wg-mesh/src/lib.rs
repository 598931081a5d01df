// WireGuard mesh configuration generator library
// Shared modules for the CLI and tests

#![warn(missing_docs)]

//! WireGuard Mesh Configuration Library
//!
//! This library turns the description of a mesh network (one network
//! identity, a subnet and a set of peers) into one WireGuard configuration
//! per peer, listing only the peers it must know and only the ranges it
//! should route through them.
//!
//! # Main Components
//!
//! - [`cidr`]: CIDR parsing and containment testing
//! - [`topology`]: Network and peer model, relay classification
//! - [`visibility`]: Which peers appear in a given peer's configuration
//! - [`allowed`]: Which ranges a peer routes toward another
//! - [`render`]: Configuration text rendering
//! - [`loader`]: Network description file parsing
//! - [`orchestrator`]: Writing every peer's configuration to disk
//! - [`settings`]: Tool settings file
//! - [`example`]: Example network description

pub mod allowed;
pub mod cidr;
pub mod error;
pub mod example;
pub mod loader;
pub mod orchestrator;
pub mod render;
pub mod settings;
pub mod topology;
pub mod visibility;

pub use error::{Error, Result};
pub use topology::{Network, Peer, Topology};
