// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Error taxonomy for the credential store and generation engine.
//!
//! Every core operation returns either a value or exactly one
//! [`ConfigServerError`]. The boundary layer maps [`ErrorKind`] onto
//! status codes; the `Display` text of the client-facing kinds is the
//! literal payload message.

use thiserror::Error;

pub const INVALID_NAME_MESSAGE: &str =
    "Name must consist of alphanumeric, underscores, dashes, and forward slashes";

pub const MISSING_CA_MESSAGE: &str = "Missing required CA name";

/// Coarse error classification used by the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidName,
    NotFound,
    MissingCa,
    Generation,
    Storage,
}

#[derive(Debug, Error)]
pub enum ConfigServerError {
    #[error("{}", INVALID_NAME_MESSAGE)]
    InvalidName,

    /// Message is preformatted, e.g. `Name 'x' not found` or `ID '7' not found`.
    #[error("{0}")]
    NotFound(String),

    #[error("{}", MISSING_CA_MESSAGE)]
    MissingCa,

    /// A `ca` reference was supplied but does not resolve to usable CA material.
    #[error("CA '{name}' could not be resolved: {reason}")]
    UnresolvableCa { name: String, reason: String },

    #[error("Credential generation failed: {0}")]
    Generation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ConfigServerError {
    pub fn name_not_found(name: &str) -> Self {
        Self::NotFound(format!("Name '{}' not found", name))
    }

    pub fn id_not_found(id: &str) -> Self {
        Self::NotFound(format!("ID '{}' not found", id))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName => ErrorKind::InvalidName,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::MissingCa | Self::UnresolvableCa { .. } => ErrorKind::MissingCa,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<sled::Error> for ConfigServerError {
    fn from(err: sled::Error) -> Self {
        ConfigServerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigServerError {
    fn from(err: serde_json::Error) -> Self {
        ConfigServerError::Storage(format!("serialization: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigServerError>;
