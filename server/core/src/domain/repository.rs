// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for configuration versions, following the DDD
//! Repository pattern: the interface lives in the domain layer and is
//! implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Implementations |
//! |-------|----------------|
//! | `ConfigurationStore` | `InMemoryConfigurationStore`, `SledConfigurationStore` |
//! | `IdAllocator` | `SequentialIdAllocator` |
//!
//! ## Storage Backend Abstraction
//!
//! The concrete store is selected at startup from the `spec.store` section of
//! the server configuration. Any engine that upholds the contract below is
//! conformant:
//!
//! - ids are unique across all names and increase with creation order
//! - `get_by_name` returns every version newest-first
//! - `delete` removes the whole history of a name in one step; concurrent
//!   readers see either all of it or none of it
//!
//! All operations are synchronous and run to completion on the caller's
//! thread.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::configuration::{Configuration, ConfigurationId, ConfigurationValue};
use crate::domain::error::ConfigServerError;

/// Storage backend selection for the configuration store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps; history is lost on restart
    Memory,
    /// Embedded sled database at `path`
    Sled { path: PathBuf },
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::Memory
    }
}

/// Versioned, append-only store of configuration values.
pub trait ConfigurationStore: Send + Sync {
    /// Append a new version for `name` and return its id.
    ///
    /// An existing name is never a conflict; the new version becomes the newest.
    fn put(
        &self,
        name: &str,
        value: ConfigurationValue,
        checksum: Option<String>,
    ) -> Result<ConfigurationId, ConfigServerError>;

    /// All versions of `name`, newest first.
    fn get_by_name(&self, name: &str) -> Result<Vec<Configuration>, ConfigServerError>;

    /// The version with the given external id, whatever its name.
    fn get_by_id(&self, id: &str) -> Result<Configuration, ConfigServerError>;

    /// Remove every version of `name`, returning how many were removed.
    fn delete(&self, name: &str) -> Result<usize, ConfigServerError>;

    /// Newest version of `name`, or `None` when the name has no history.
    fn latest(&self, name: &str) -> Result<Option<Configuration>, ConfigServerError> {
        match self.get_by_name(name) {
            Ok(versions) => Ok(versions.into_iter().next()),
            Err(ConfigServerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Source of unique, monotonically increasing version ids.
pub trait IdAllocator: Send + Sync {
    fn next_id(&self) -> Result<ConfigurationId, ConfigServerError>;
}
