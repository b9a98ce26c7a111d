// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Process-local id sequence for the in-memory store.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::configuration::ConfigurationId;
use crate::domain::error::ConfigServerError;
use crate::domain::repository::IdAllocator;

/// Atomic counter handing out 1, 2, 3, ...
#[derive(Debug)]
pub struct SequentialIdAllocator {
    next: AtomicU64,
}

impl SequentialIdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for SequentialIdAllocator {
    fn next_id(&self) -> Result<ConfigurationId, ConfigServerError> {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        if id == u64::MAX {
            return Err(ConfigServerError::Storage("id sequence exhausted".to_string()));
        }
        Ok(ConfigurationId(id))
    }
}
