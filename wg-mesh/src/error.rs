// Error taxonomy for topology resolution and rendering

//! Unified error types for wg-mesh
//!
//! Every failure carries enough context (network, peer, field, offending
//! value) to produce an actionable message. Nothing here is recovered from
//! locally; callers decide whether to abort a network or a whole batch.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for wg-mesh operations
#[derive(Error, Debug)]
pub enum Error {
    /// A value that should be in CIDR notation could not be parsed
    #[error("invalid CIDR '{value}': {reason}")]
    InvalidCidr {
        /// The offending value, as written
        value: String,
        /// Parser explanation
        reason: String,
    },

    /// A field of a network or peer failed validation
    #[error("invalid {field} '{value}' for {subject}: {reason}")]
    Validation {
        /// What is being validated, e.g. `peer 'Tento'`
        subject: String,
        /// Field name as it appears in the network description
        field: &'static str,
        /// The offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A peer identifier was requested that the network does not declare
    #[error("peer '{peer}' not found in network '{network}'")]
    NotFound {
        /// Network identifier
        network: String,
        /// Requested peer identifier
        peer: String,
    },

    /// The network description could not be mapped to a topology
    #[error("failed to parse '{origin}': {message}")]
    Parse {
        /// File path or other description of the source text
        origin: String,
        /// What went wrong
        message: String,
    },

    /// Filesystem failure while reading input or writing peer files
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Any of the above, scoped to a network
    #[error("network '{network}': {inner}")]
    Network {
        /// Network identifier
        network: String,
        /// Wrapped error, already part of this error's message
        inner: Box<Error>,
    },
}

impl Error {
    /// Scope this error to a network, unless it already names one.
    pub fn in_network(self, network: &str) -> Self {
        match self {
            Error::NotFound { .. } | Error::Network { .. } => self,
            other => Error::Network {
                network: network.to_string(),
                inner: Box::new(other),
            },
        }
    }

    /// Attach peer and field context to a CIDR parse failure.
    pub(crate) fn for_peer_field(self, peer: &str, field: &'static str) -> Self {
        match self {
            Error::InvalidCidr { value, reason } => Error::Validation {
                subject: format!("peer '{}'", peer),
                field,
                value,
                reason,
            },
            other => other,
        }
    }

    /// Build an I/O error for `path`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the validation family (malformed CIDR, endpoint, identifiers).
    pub fn is_validation(&self) -> bool {
        match self {
            Error::InvalidCidr { .. } | Error::Validation { .. } => true,
            Error::Network { inner, .. } => inner.is_validation(),
            _ => false,
        }
    }

    /// True when a requested peer does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Network { inner, .. } => inner.is_not_found(),
            _ => false,
        }
    }
}

/// Result type alias for wg-mesh operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_network_wraps_once() {
        let err = Error::InvalidCidr {
            value: "bogus".to_string(),
            reason: "invalid IP address syntax".to_string(),
        }
        .in_network("office")
        .in_network("other");

        let msg = err.to_string();
        assert!(msg.starts_with("network 'office': "));
        assert!(msg.contains("bogus"));
        assert!(!msg.contains("other"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_not_found_keeps_its_own_network() {
        let err = Error::NotFound {
            network: "office".to_string(),
            peer: "ghost".to_string(),
        }
        .in_network("office");

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "peer 'ghost' not found in network 'office'");
    }

    #[test]
    fn test_for_peer_field_names_everything() {
        let err = Error::InvalidCidr {
            value: "10.0.0.0/99".to_string(),
            reason: "invalid IP address syntax".to_string(),
        }
        .for_peer_field("Pata", "AllowedIPs");

        assert_eq!(
            err.to_string(),
            "invalid AllowedIPs '10.0.0.0/99' for peer 'Pata': invalid IP address syntax"
        );
    }
}
