// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the `ConfigurationStore` contract
//! defined in the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve configuration versions
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **InMemoryConfigurationStore** - `RwLock`-guarded maps, for development and tests
//! - **SledConfigurationStore** - embedded sled database, survives restarts
//!
//! # Usage
//!
//! ```
//! use config_server_core::domain::{ConfigurationStore, ConfigurationValue};
//! use config_server_core::infrastructure::InMemoryConfigurationStore;
//!
//! let store = InMemoryConfigurationStore::new();
//! let id = store.put("smurf", ConfigurationValue::Text("blue".into()), None).unwrap();
//! assert_eq!(store.get_by_id(&id.to_string()).unwrap().name, "smurf");
//! ```

pub mod sled_store;

pub use sled_store::SledConfigurationStore;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::configuration::{Configuration, ConfigurationId, ConfigurationValue};
use crate::domain::error::ConfigServerError;
use crate::domain::name;
use crate::domain::repository::{ConfigurationStore, IdAllocator};
use crate::infrastructure::id_allocator::SequentialIdAllocator;

#[derive(Default)]
struct Versions {
    by_id: HashMap<ConfigurationId, Configuration>,
    /// Ids per name in creation order (oldest first)
    by_name: HashMap<String, Vec<ConfigurationId>>,
}

#[derive(Clone)]
pub struct InMemoryConfigurationStore {
    versions: Arc<RwLock<Versions>>,
    ids: Arc<dyn IdAllocator>,
}

impl InMemoryConfigurationStore {
    pub fn new() -> Self {
        Self::with_id_allocator(Arc::new(SequentialIdAllocator::new()))
    }

    pub fn with_id_allocator(ids: Arc<dyn IdAllocator>) -> Self {
        Self {
            versions: Arc::new(RwLock::new(Versions::default())),
            ids,
        }
    }
}

impl Default for InMemoryConfigurationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationStore for InMemoryConfigurationStore {
    fn put(
        &self,
        name: &str,
        value: ConfigurationValue,
        checksum: Option<String>,
    ) -> Result<ConfigurationId, ConfigServerError> {
        name::validate(name)?;

        // Allocate under the write lock so id order matches visibility order
        let mut versions = self.versions.write();
        let id = self.ids.next_id()?;

        versions.by_id.insert(
            id,
            Configuration {
                id,
                name: name.to_string(),
                value,
                checksum,
            },
        );
        versions.by_name.entry(name.to_string()).or_default().push(id);

        Ok(id)
    }

    fn get_by_name(&self, name: &str) -> Result<Vec<Configuration>, ConfigServerError> {
        name::validate(name)?;

        let versions = self.versions.read();
        let ids = versions
            .by_name
            .get(name)
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| ConfigServerError::name_not_found(name))?;

        ids.iter()
            .rev()
            .map(|id| {
                versions.by_id.get(id).cloned().ok_or_else(|| {
                    ConfigServerError::Storage(format!("index references missing version {}", id))
                })
            })
            .collect()
    }

    fn get_by_id(&self, id: &str) -> Result<Configuration, ConfigServerError> {
        let parsed = ConfigurationId::parse(id).ok_or_else(|| ConfigServerError::id_not_found(id))?;

        let versions = self.versions.read();
        versions
            .by_id
            .get(&parsed)
            .cloned()
            .ok_or_else(|| ConfigServerError::id_not_found(id))
    }

    fn delete(&self, name: &str) -> Result<usize, ConfigServerError> {
        name::validate(name)?;

        let mut versions = self.versions.write();
        let ids = versions
            .by_name
            .remove(name)
            .ok_or_else(|| ConfigServerError::name_not_found(name))?;

        for id in &ids {
            versions.by_id.remove(id);
        }

        if ids.is_empty() {
            return Err(ConfigServerError::name_not_found(name));
        }
        Ok(ids.len())
    }
}
