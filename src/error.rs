//! Embargo engine error types

use crate::embargo::{EmbargoId, ResourceKind};
use thiserror::Error;

/// Embargo engine error type
#[derive(Error, Debug)]
pub enum Error {
    /// An access checker bound to one resource kind was handed another
    #[error("Attempting to check embargoed access status for {actual} {id} (expected: {expected})")]
    InvalidResourceKind {
        expected: ResourceKind,
        actual: ResourceKind,
        id: String,
    },

    /// A record id returned by the repository could not be loaded back
    #[error("Integrity error for embargo {embargo}: {reason}")]
    Integrity { embargo: EmbargoId, reason: String },

    /// A stored record does not describe one of the supported embargo shapes
    #[error("Invalid embargo record {embargo}: {reason}")]
    InvalidRecord { embargo: EmbargoId, reason: String },

    /// Embargo repository failure
    #[error("Repository error: {0}")]
    Repository(String),

    /// Content graph lookup failure
    #[error("Graph error: {0}")]
    Graph(String),

    /// Group membership lookup failure
    #[error("Group membership error: {0}")]
    Groups(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether an access check that hit this error must deny access.
    ///
    /// Configuration and local IO problems happen before any check runs;
    /// everything else means the decision could not be trusted.
    pub fn is_fail_closed(&self) -> bool {
        !matches!(
            self,
            Error::Config(_) | Error::Io(_) | Error::Serialization(_) | Error::Toml(_)
        )
    }
}

/// Result type alias for embargo operations
pub type Result<T> = std::result::Result<T, Error>;
