// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Store Factory - Application Layer
//!
//! Creates the concrete `ConfigurationStore` selected by the `spec.store`
//! section of the server configuration.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Keep backend selection out of the domain layer

use std::sync::Arc;

use crate::domain::error::ConfigServerError;
use crate::domain::repository::{ConfigurationStore, StorageBackend};
use crate::infrastructure::repositories::{InMemoryConfigurationStore, SledConfigurationStore};

/// Creates a ConfigurationStore implementation based on the configured backend
pub fn create_configuration_store(
    backend: &StorageBackend,
) -> Result<Arc<dyn ConfigurationStore>, ConfigServerError> {
    match backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryConfigurationStore::new())),
        StorageBackend::Sled { path } => Ok(Arc::new(SledConfigurationStore::open(path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::configuration::ConfigurationValue;

    #[test]
    fn test_memory_backend() {
        let store = create_configuration_store(&StorageBackend::Memory).unwrap();
        let id = store.put("smurf", ConfigurationValue::Text("blue".into()), None).unwrap();
        assert_eq!(store.get_by_id(&id.to_string()).unwrap().name, "smurf");
    }

    #[test]
    fn test_sled_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StorageBackend::Sled {
            path: dir.path().join("store"),
        };
        let store = create_configuration_store(&backend).unwrap();
        store.put("smurf", ConfigurationValue::Text("blue".into()), None).unwrap();
        assert_eq!(store.get_by_name("smurf").unwrap().len(), 1);
    }
}
