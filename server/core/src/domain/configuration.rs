// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier of one stored version.
///
/// Allocated from a monotonic sequence, so a newer version always compares
/// greater than an older one. Rendered externally as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigurationId(pub u64);

impl ConfigurationId {
    /// Parse an externally supplied id. Anything that is not a decimal
    /// `u64` cannot name a stored version.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<u64>().ok().map(Self)
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ConfigurationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConfigurationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ConfigurationId::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid configuration id '{}'", raw)))
    }
}

/// PEM-encoded certificate material produced by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificateCredential {
    /// The issued certificate
    pub certificate: String,

    /// PKCS#8 private key of `certificate`
    pub private_key: String,

    /// Certificate of the signer (the certificate itself for a root CA)
    pub ca: String,
}

/// Value held by one version.
///
/// Raw puts accept arbitrary JSON (including `null`); generated passwords
/// are text and generated certificates are [`CertificateCredential`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigurationValue {
    Certificate(CertificateCredential),
    Text(String),
    Json(serde_json::Value),
}

impl ConfigurationValue {
    pub fn as_certificate(&self) -> Option<&CertificateCredential> {
        match self {
            Self::Certificate(credential) => Some(credential),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for ConfigurationValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Self::Text(text),
            other => serde_json::from_value::<CertificateCredential>(other.clone())
                .map(Self::Certificate)
                .unwrap_or(Self::Json(other)),
        }
    }
}

/// One immutable version of a name's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub id: ConfigurationId,
    pub name: String,
    pub value: ConfigurationValue,

    /// Fingerprint of the generation parameters; `None` for raw puts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_ordering_and_parse() {
        assert!(ConfigurationId(2) > ConfigurationId(1));
        assert_eq!(ConfigurationId::parse("42"), Some(ConfigurationId(42)));
        assert_eq!(ConfigurationId::parse("abc"), None);
        assert_eq!(ConfigurationId::parse("-1"), None);
    }

    #[test]
    fn test_id_serializes_as_string() {
        let encoded = serde_json::to_value(ConfigurationId(7)).unwrap();
        assert_eq!(encoded, json!("7"));
    }

    #[test]
    fn test_value_classification() {
        assert_eq!(ConfigurationValue::from(json!("blue")), ConfigurationValue::Text("blue".into()));
        assert_eq!(ConfigurationValue::from(json!(null)), ConfigurationValue::Json(json!(null)));

        let cert = ConfigurationValue::from(json!({
            "certificate": "c", "private_key": "k", "ca": "a"
        }));
        assert!(cert.as_certificate().is_some());

        // Extra fields keep the raw object intact instead of dropping data
        let raw = json!({"certificate": "c", "private_key": "k", "ca": "a", "extra": 1});
        assert_eq!(ConfigurationValue::from(raw.clone()), ConfigurationValue::Json(raw));
    }

    #[test]
    fn test_configuration_serialization_omits_empty_checksum() {
        let config = Configuration {
            id: ConfigurationId(1),
            name: "smurf".to_string(),
            value: ConfigurationValue::Text("blue".to_string()),
            checksum: None,
        };
        let encoded = serde_json::to_value(&config).unwrap();
        assert_eq!(encoded, json!({"id": "1", "name": "smurf", "value": "blue"}));

        let decoded: Configuration = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, config);
    }
}
