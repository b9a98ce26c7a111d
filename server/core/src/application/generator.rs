// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Credential Generator - Application Layer
//!
//! Produces password and certificate values for a [`CredentialRequest`].
//! Signing CAs are looked up by name in the configuration store on every
//! call (newest version wins); the generator itself never writes.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Turn validated request parameters into credential values

use rand::Rng;
use std::sync::Arc;
use tracing::debug;

use crate::domain::configuration::{CertificateCredential, ConfigurationValue};
use crate::domain::credential::{CertificateParameters, CredentialRequest, CredentialType};
use crate::domain::error::ConfigServerError;
use crate::domain::repository::ConfigurationStore;
use crate::domain::server_config::CertificateDefaults;
use crate::infrastructure::pki::{self, CertificateInfo, CertificateProfile};

const PASSWORD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random string over `[a-z0-9]`.
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| PASSWORD_ALPHABET[rng.random_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

pub struct CredentialGenerator {
    store: Arc<dyn ConfigurationStore>,
    defaults: CertificateDefaults,
}

impl CredentialGenerator {
    pub fn new(store: Arc<dyn ConfigurationStore>, defaults: CertificateDefaults) -> Self {
        Self { store, defaults }
    }

    pub fn generate(&self, request: &CredentialRequest) -> Result<ConfigurationValue, ConfigServerError> {
        match request.credential_type {
            CredentialType::Password => {
                let params = request.password_parameters()?;
                Ok(ConfigurationValue::Text(generate_password(params.length)))
            }
            CredentialType::RootCertificateCa => {
                let params = request.certificate_parameters()?;
                let issued = pki::self_sign(&self.profile(request, &params, true))?;
                Ok(ConfigurationValue::Certificate(CertificateCredential {
                    ca: issued.certificate_pem.clone(),
                    certificate: issued.certificate_pem,
                    private_key: issued.private_key_pem,
                }))
            }
            CredentialType::IntermediateCertificateCa | CredentialType::Certificate => {
                let params = request.certificate_parameters()?;
                let ca_name = params
                    .ca
                    .as_deref()
                    .filter(|ca| !ca.is_empty())
                    .ok_or(ConfigServerError::MissingCa)?;
                let signer = self.resolve_ca(ca_name)?;

                let is_ca = request.credential_type == CredentialType::IntermediateCertificateCa;
                let issued = pki::sign(
                    &self.profile(request, &params, is_ca),
                    &signer.certificate,
                    &signer.private_key,
                )?;

                Ok(ConfigurationValue::Certificate(CertificateCredential {
                    certificate: issued.certificate_pem,
                    private_key: issued.private_key_pem,
                    ca: signer.certificate,
                }))
            }
        }
    }

    fn profile(
        &self,
        request: &CredentialRequest,
        params: &CertificateParameters,
        is_ca: bool,
    ) -> CertificateProfile {
        // Root and intermediate CAs carry no SANs or EKUs
        let leaf = request.credential_type == CredentialType::Certificate;

        CertificateProfile {
            common_name: params.common_name.clone().unwrap_or_else(|| request.name.clone()),
            organization: params
                .organization
                .clone()
                .unwrap_or_else(|| self.defaults.organization.clone()),
            country: self.defaults.country.clone(),
            validity_days: params.duration,
            is_ca,
            alternative_names: if leaf { params.alternative_names.clone() } else { vec![] },
            extended_key_usage: if leaf { params.extended_key_usage.clone() } else { vec![] },
        }
    }

    /// Newest version of `ca_name`, which must hold a CA certificate and key.
    fn resolve_ca(&self, ca_name: &str) -> Result<CertificateCredential, ConfigServerError> {
        let unresolvable = |reason: &str| ConfigServerError::UnresolvableCa {
            name: ca_name.to_string(),
            reason: reason.to_string(),
        };

        let latest = match self.store.latest(ca_name) {
            Ok(latest) => latest,
            Err(ConfigServerError::InvalidName) => return Err(unresolvable("invalid name")),
            Err(e) => return Err(e),
        };
        let version = latest.ok_or_else(|| unresolvable("name not found"))?;

        let credential = version
            .value
            .as_certificate()
            .cloned()
            .ok_or_else(|| unresolvable("value is not a certificate"))?;

        let info = CertificateInfo::from_pem(&credential.certificate)
            .map_err(|e| unresolvable(&e.to_string()))?;
        if !info.is_ca {
            return Err(unresolvable("certificate is not a certificate authority"));
        }

        debug!(ca = %ca_name, id = %version.id, "Resolved signing CA");
        Ok(credential)
    }
}
