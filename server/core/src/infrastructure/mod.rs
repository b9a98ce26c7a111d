// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod id_allocator;
pub mod pki;
pub mod repositories;

pub use id_allocator::SequentialIdAllocator;
pub use repositories::{InMemoryConfigurationStore, SledConfigurationStore};
