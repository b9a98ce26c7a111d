// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Convergence Controller - Application Layer
//!
//! Entry point for credential generation requests. In `store` mode every
//! request mints a new version. In `converge` mode the newest version of the
//! name is returned unchanged when its checksum matches the request's
//! parameter fingerprint.
//!
//! Two concurrent converge requests for the same fresh name may both miss and
//! both store a version; the newer one then wins for later readers.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::application::generator::CredentialGenerator;
use crate::domain::configuration::Configuration;
use crate::domain::credential::{CredentialRequest, GenerationMode};
use crate::domain::error::{ConfigServerError, ErrorKind};
use crate::domain::name;
use crate::domain::repository::ConfigurationStore;

pub struct ConvergenceController {
    store: Arc<dyn ConfigurationStore>,
    generator: CredentialGenerator,
}

impl ConvergenceController {
    pub fn new(store: Arc<dyn ConfigurationStore>, generator: CredentialGenerator) -> Self {
        Self { store, generator }
    }

    pub fn provide(&self, request: &CredentialRequest) -> Result<Configuration, ConfigServerError> {
        name::validate(&request.name)?;
        let fingerprint = request.fingerprint();

        if request.mode == GenerationMode::Converge {
            if let Some(current) = self.store.latest(&request.name)? {
                if current.checksum.as_deref() == Some(fingerprint.as_str()) {
                    debug!(
                        name = %request.name,
                        id = %current.id,
                        credential_type = %request.credential_type,
                        "Parameters unchanged, reusing stored version"
                    );
                    return Ok(current);
                }
            }
        }

        let value = self.generator.generate(request).inspect_err(|e| {
            if matches!(e.kind(), ErrorKind::Generation | ErrorKind::Storage) {
                error!(name = %request.name, credential_type = %request.credential_type, error = %e, "Credential generation failed");
            }
        })?;

        let id = self
            .store
            .put(&request.name, value.clone(), Some(fingerprint.clone()))
            .inspect_err(|e| error!(name = %request.name, error = %e, "Failed to store generated credential"))?;

        info!(
            name = %request.name,
            id = %id,
            credential_type = %request.credential_type,
            mode = ?request.mode,
            "Generated credential"
        );

        Ok(Configuration {
            id,
            name: request.name.clone(),
            value,
            checksum: Some(fingerprint),
        })
    }
}
