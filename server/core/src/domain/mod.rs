// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Configuration versions, credential requests, the store contract and the
//! error taxonomy shared by every layer.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and rules, no I/O

pub mod configuration;
pub mod credential;
pub mod error;
pub mod name;
pub mod repository;
pub mod server_config;

pub use configuration::{CertificateCredential, Configuration, ConfigurationId, ConfigurationValue};
pub use credential::{CredentialRequest, CredentialType, GenerationMode};
pub use error::{ConfigServerError, ErrorKind};
pub use repository::{ConfigurationStore, IdAllocator, StorageBackend};
