// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Sled-backed configuration store.
//!
//! Layout:
//!
//! | Tree | Key | Value |
//! |------|-----|-------|
//! | `configurations` | id (big-endian `u64`) | JSON [`Configuration`] |
//! | `names` | name (UTF-8) | JSON array of ids, oldest first |
//!
//! Writes touch both trees inside one sled transaction and are flushed
//! before returning.

use parking_lot::RwLock;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::{Transactional, Tree};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::configuration::{Configuration, ConfigurationId, ConfigurationValue};
use crate::domain::error::ConfigServerError;
use crate::domain::name;
use crate::domain::repository::{ConfigurationStore, IdAllocator};

const CONFIGURATIONS_TREE: &str = "configurations";
const NAMES_TREE: &str = "names";

/// Id sequence persisted by sled itself, so ids keep increasing across restarts.
pub struct SledIdAllocator {
    db: sled::Db,
}

impl SledIdAllocator {
    pub fn new(db: sled::Db) -> Self {
        Self { db }
    }
}

impl IdAllocator for SledIdAllocator {
    fn next_id(&self) -> Result<ConfigurationId, ConfigServerError> {
        // sled starts at 0; external ids start at 1
        let raw = self.db.generate_id()?;
        raw.checked_add(1)
            .map(ConfigurationId)
            .ok_or_else(|| ConfigServerError::Storage("id sequence exhausted".to_string()))
    }
}

pub struct SledConfigurationStore {
    db: sled::Db,
    configurations: Tree,
    names: Tree,
    ids: Arc<dyn IdAllocator>,
    /// Serializes writers and gives readers a consistent view across both trees
    lock: RwLock<()>,
}

impl SledConfigurationStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigServerError> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let configurations = db.open_tree(CONFIGURATIONS_TREE)?;
        let names = db.open_tree(NAMES_TREE)?;

        info!(
            path = %path.display(),
            versions = configurations.len(),
            names = names.len(),
            "Opened sled configuration store"
        );

        Ok(Self {
            ids: Arc::new(SledIdAllocator::new(db.clone())),
            db,
            configurations,
            names,
            lock: RwLock::new(()),
        })
    }

    fn decode_ids(raw: &[u8]) -> Result<Vec<ConfigurationId>, serde_json::Error> {
        let ids: Vec<u64> = serde_json::from_slice(raw)?;
        Ok(ids.into_iter().map(ConfigurationId).collect())
    }

    fn encode_ids(ids: &[ConfigurationId]) -> Result<Vec<u8>, serde_json::Error> {
        let raw: Vec<u64> = ids.iter().map(|id| id.0).collect();
        serde_json::to_vec(&raw)
    }

    fn load(&self, id: ConfigurationId) -> Result<Option<Configuration>, ConfigServerError> {
        match self.configurations.get(id.to_be_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }
}

fn abort<E: Into<ConfigServerError>>(err: E) -> ConflictableTransactionError<ConfigServerError> {
    ConflictableTransactionError::Abort(err.into())
}

fn unwrap_transaction(err: TransactionError<ConfigServerError>) -> ConfigServerError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => e.into(),
    }
}

impl ConfigurationStore for SledConfigurationStore {
    fn put(
        &self,
        name: &str,
        value: ConfigurationValue,
        checksum: Option<String>,
    ) -> Result<ConfigurationId, ConfigServerError> {
        name::validate(name)?;

        let _guard = self.lock.write();
        let id = self.ids.next_id()?;
        let record = serde_json::to_vec(&Configuration {
            id,
            name: name.to_string(),
            value,
            checksum,
        })?;

        (&self.configurations, &self.names)
            .transaction(|(configurations, names)| -> ConflictableTransactionResult<(), ConfigServerError> {
                let mut ids = match names.get(name.as_bytes())? {
                    Some(raw) => Self::decode_ids(&raw).map_err(abort)?,
                    None => Vec::new(),
                };
                ids.push(id);

                configurations.insert(&id.to_be_bytes()[..], record.as_slice())?;
                names.insert(name.as_bytes(), Self::encode_ids(&ids).map_err(abort)?)?;
                Ok(())
            })
            .map_err(unwrap_transaction)?;

        self.db.flush()?;
        debug!(name = %name, id = %id, "Stored configuration version");
        Ok(id)
    }

    fn get_by_name(&self, name: &str) -> Result<Vec<Configuration>, ConfigServerError> {
        name::validate(name)?;

        let _guard = self.lock.read();
        let ids = match self.names.get(name.as_bytes())? {
            Some(raw) => Self::decode_ids(&raw)?,
            None => Vec::new(),
        };
        if ids.is_empty() {
            return Err(ConfigServerError::name_not_found(name));
        }

        ids.into_iter()
            .rev()
            .map(|id| {
                self.load(id)?.ok_or_else(|| {
                    ConfigServerError::Storage(format!("index references missing version {}", id))
                })
            })
            .collect()
    }

    fn get_by_id(&self, id: &str) -> Result<Configuration, ConfigServerError> {
        let parsed = ConfigurationId::parse(id).ok_or_else(|| ConfigServerError::id_not_found(id))?;

        let _guard = self.lock.read();
        self.load(parsed)?
            .ok_or_else(|| ConfigServerError::id_not_found(id))
    }

    fn delete(&self, name: &str) -> Result<usize, ConfigServerError> {
        name::validate(name)?;

        let _guard = self.lock.write();
        let removed = (&self.configurations, &self.names)
            .transaction(|(configurations, names)| -> ConflictableTransactionResult<usize, ConfigServerError> {
                let ids = match names.remove(name.as_bytes())? {
                    Some(raw) => Self::decode_ids(&raw).map_err(abort)?,
                    None => Vec::new(),
                };
                if ids.is_empty() {
                    return Err(abort(ConfigServerError::name_not_found(name)));
                }

                for id in &ids {
                    configurations.remove(&id.to_be_bytes()[..])?;
                }
                Ok(ids.len())
            })
            .map_err(unwrap_transaction)?;

        self.db.flush()?;
        info!(name = %name, versions = removed, "Deleted configuration history");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn text(s: &str) -> ConfigurationValue {
        ConfigurationValue::Text(s.to_string())
    }

    #[test]
    fn test_put_get_delete() {
        let dir = tempdir().unwrap();
        let store = SledConfigurationStore::open(dir.path().join("db")).unwrap();

        let first = store.put("smurf", text("green"), None).unwrap();
        let second = store
            .put("smurf", text("blue"), Some("abc123".to_string()))
            .unwrap();
        assert!(second > first);

        let versions = store.get_by_name("smurf").unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].id, second);
        assert_eq!(versions[0].checksum.as_deref(), Some("abc123"));
        assert_eq!(versions[1].value, text("green"));

        assert_eq!(store.delete("smurf").unwrap(), 2);
        assert!(matches!(store.get_by_name("smurf"), Err(ConfigServerError::NotFound(_))));
        assert!(matches!(
            store.get_by_id(&first.to_string()),
            Err(ConfigServerError::NotFound(_))
        ));
        assert_eq!(
            store.delete("smurf").unwrap_err().to_string(),
            "Name 'smurf' not found"
        );
    }

    #[test]
    fn test_history_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");

        let before = {
            let store = SledConfigurationStore::open(&path).unwrap();
            store.put("smurf", text("blue"), None).unwrap();
            store
                .put("cert", ConfigurationValue::Json(json!({"nested": [1, 2]})), None)
                .unwrap()
        };

        let store = SledConfigurationStore::open(&path).unwrap();
        assert_eq!(store.get_by_name("smurf").unwrap()[0].value, text("blue"));
        assert_eq!(
            store.get_by_id(&before.to_string()).unwrap().value,
            ConfigurationValue::Json(json!({"nested": [1, 2]}))
        );

        let after = store.put("smurf", text("red"), None).unwrap();
        assert!(after > before);
    }

    #[test]
    fn test_invalid_name_and_id() {
        let dir = tempdir().unwrap();
        let store = SledConfigurationStore::open(dir.path().join("db")).unwrap();

        assert!(matches!(
            store.put("bad name", text("x"), None),
            Err(ConfigServerError::InvalidName)
        ));
        assert_eq!(store.get_by_id("nope").unwrap_err().to_string(), "ID 'nope' not found");
    }
}
