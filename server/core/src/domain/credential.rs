// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Credential Requests
//!
//! Transient input to the generation engine: a target name, the credential
//! type, type-specific parameters and the generation mode.
//!
//! | Type | Parameters |
//! |------|------------|
//! | `password` | `length` (default 20) |
//! | `root-certificate-ca` | `common_name`, `duration`, `organization` |
//! | `intermediate-certificate-ca` | as above plus required `ca` |
//! | `certificate` | as above plus `alternative_names`, `extended_key_usage` |
//!
//! The parameter fingerprint is what the convergence controller compares
//! to decide whether a stored version can be reused.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ConfigServerError;

pub const DEFAULT_PASSWORD_LENGTH: usize = 20;
/// Largest accepted password `length`.
pub const MAX_PASSWORD_LENGTH: usize = 4096;
pub const DEFAULT_CERTIFICATE_DURATION_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialType {
    Password,
    Certificate,
    RootCertificateCa,
    IntermediateCertificateCa,
}

impl CredentialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Certificate => "certificate",
            Self::RootCertificateCa => "root-certificate-ca",
            Self::IntermediateCertificateCa => "intermediate-certificate-ca",
        }
    }

    /// Types that must be signed by a stored CA.
    pub fn requires_ca(&self) -> bool {
        matches!(self, Self::Certificate | Self::IntermediateCertificateCa)
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(Self::Password),
            "certificate" => Ok(Self::Certificate),
            "root-certificate-ca" => Ok(Self::RootCertificateCa),
            "intermediate-certificate-ca" => Ok(Self::IntermediateCertificateCa),
            other => Err(format!("Unsupported credential type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Always mint a new version
    #[default]
    Store,
    /// Reuse the newest version while its parameters are unchanged
    Converge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CredentialRequest {
    pub name: String,
    pub credential_type: CredentialType,
    pub parameters: Map<String, Value>,
    pub mode: GenerationMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordParameters {
    pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendedKeyUsage {
    ServerAuth,
    ClientAuth,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CertificateParameters {
    pub common_name: Option<String>,
    pub alternative_names: Vec<String>,
    pub ca: Option<String>,
    pub extended_key_usage: Vec<ExtendedKeyUsage>,
    /// Validity in days
    pub duration: u32,
    pub organization: Option<String>,
}

impl Default for CertificateParameters {
    fn default() -> Self {
        Self {
            common_name: None,
            alternative_names: vec![],
            ca: None,
            extended_key_usage: vec![],
            duration: DEFAULT_CERTIFICATE_DURATION_DAYS,
            organization: None,
        }
    }
}

impl CredentialRequest {
    pub fn new(name: impl Into<String>, credential_type: CredentialType) -> Self {
        Self {
            name: name.into(),
            credential_type,
            parameters: Map::new(),
            mode: GenerationMode::Store,
        }
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, key: &str, value: Value) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Deterministic digest of `(type, parameters)`.
    ///
    /// Object keys are sorted at every depth before hashing, so two requests
    /// with the same parameters in a different key order share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut canonical = Map::new();
        canonical.insert("parameters".to_string(), canonicalize(Value::Object(self.parameters.clone())));
        canonical.insert("type".to_string(), Value::String(self.credential_type.as_str().to_string()));

        let encoded = Value::Object(canonical).to_string();
        hex::encode(Sha256::digest(encoded.as_bytes()))
    }

    pub fn password_parameters(&self) -> Result<PasswordParameters, ConfigServerError> {
        let length = match self.parameters.get("length") {
            None | Some(Value::Null) => DEFAULT_PASSWORD_LENGTH,
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    ConfigServerError::Generation(format!("length must be a positive integer, got {}", n))
                })?,
            Some(other) => {
                return Err(ConfigServerError::Generation(format!(
                    "length must be a positive integer, got {}",
                    other
                )))
            }
        };

        if length == 0 {
            return Err(ConfigServerError::Generation(
                "length must be a positive integer, got 0".to_string(),
            ));
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(ConfigServerError::Generation(format!(
                "length must be at most {}, got {}",
                MAX_PASSWORD_LENGTH, length
            )));
        }

        Ok(PasswordParameters { length })
    }

    pub fn certificate_parameters(&self) -> Result<CertificateParameters, ConfigServerError> {
        let params: CertificateParameters =
            serde_json::from_value(Value::Object(self.parameters.clone())).map_err(|e| {
                ConfigServerError::Generation(format!("invalid certificate parameters: {}", e))
            })?;

        if params.duration == 0 {
            return Err(ConfigServerError::Generation(
                "duration must be at least one day".to_string(),
            ));
        }

        Ok(params)
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
