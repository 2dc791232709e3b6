//! # Port Errors
//!
//! Failures reported by capability implementations and the kernel's
//! lightweight components.

use thiserror::Error;

/// Errors raised behind a capability interface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("No storage engine available")]
    NoStorageEngine,

    #[error("Database '{database}' has panicked: {cause}")]
    DatabasePanicked { database: String, cause: String },

    #[error("Database '{database}' is unavailable: {reason}")]
    Unavailable { database: String, reason: String },

    #[error("Invalid value for setting '{setting}': {value}")]
    InvalidSetting { setting: String, value: String },

    #[error("Malformed settings document: {0}")]
    MalformedSettings(String),

    #[error("I/O failure on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Schema writes are not allowed on '{database}'")]
    SchemaWritesForbidden { database: String },

    #[error("Token name must not be empty")]
    EmptyTokenName,
}

impl PortError {
    /// Shorthand for an I/O failure on a path.
    pub fn io(path: &std::path::Path, reason: impl Into<String>) -> Self {
        PortError::Io {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}
