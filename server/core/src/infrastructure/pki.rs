// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! X.509 issuance and inspection
//!
//! Every certificate gets a freshly generated ECDSA P-256 key. Children are
//! signed with the parent's stored certificate and key; the parent's subject
//! becomes the child's issuer and the parent's SKI becomes the child's AKI.
//!
//! Nothing here touches the store. Callers resolve signer material first and
//! hand the PEM strings in.

use rcgen::{
    string::{Ia5String, PrintableString},
    BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType,
};
use thiserror::Error;
use x509_parser::prelude::*;

use crate::domain::credential::ExtendedKeyUsage;
use crate::domain::error::ConfigServerError;

#[derive(Debug, Error)]
pub enum PkiError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("certificate generation failed: {0}")]
    CertificateGeneration(String),

    #[error("invalid subject alternative name '{0}'")]
    InvalidSubjectAltName(String),

    #[error("certificate parsing error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, PkiError>;

impl From<PkiError> for ConfigServerError {
    fn from(err: PkiError) -> Self {
        ConfigServerError::Generation(err.to_string())
    }
}

/// (not_before, not_after) starting now; fails when `not_after` is not representable
fn compute_validity(days: u32) -> Result<(::time::OffsetDateTime, ::time::OffsetDateTime)> {
    let now = ::time::OffsetDateTime::now_utc();
    let not_after = now
        .checked_add(::time::Duration::days(i64::from(days)))
        .ok_or_else(|| PkiError::CertificateGeneration(format!("validity of {} days is out of range", days)))?;
    Ok((now, not_after))
}

/// Parse PEM-encoded data and return the DER bytes
pub fn parse_pem(pem_data: &str) -> Result<Vec<u8>> {
    let pem_obj = ::pem::parse(pem_data.as_bytes())
        .map_err(|e| PkiError::Parse(format!("failed to parse PEM: {}", e)))?;
    Ok(pem_obj.contents().to_vec())
}

/// What to put into a certificate, independent of who signs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateProfile {
    pub common_name: String,
    pub organization: String,
    pub country: String,
    pub validity_days: u32,
    pub is_ca: bool,
    pub alternative_names: Vec<String>,
    pub extended_key_usage: Vec<ExtendedKeyUsage>,
}

/// PEM pair produced by issuance.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub certificate_pem: String,
    pub private_key_pem: String,
}

impl CertificateProfile {
    fn to_params(&self) -> Result<CertificateParams> {
        let mut params = CertificateParams::default();

        let mut dn = DistinguishedName::new();
        dn.push(
            DnType::CountryName,
            DnValue::PrintableString(PrintableString::try_from(self.country.clone()).map_err(
                |e| PkiError::CertificateGeneration(format!("invalid country '{}': {}", self.country, e)),
            )?),
        );
        dn.push(
            DnType::OrganizationName,
            DnValue::Utf8String(self.organization.clone()),
        );
        dn.push(DnType::CommonName, DnValue::Utf8String(self.common_name.clone()));
        params.distinguished_name = dn;

        if self.is_ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
            params.key_usages = vec![
                KeyUsagePurpose::KeyCertSign,
                KeyUsagePurpose::CrlSign,
                KeyUsagePurpose::DigitalSignature,
            ];
        } else {
            params.is_ca = IsCa::ExplicitNoCa;
            params.key_usages = vec![
                KeyUsagePurpose::DigitalSignature,
                KeyUsagePurpose::KeyEncipherment,
            ];
        }

        params.extended_key_usages = self
            .extended_key_usage
            .iter()
            .map(|usage| match usage {
                ExtendedKeyUsage::ServerAuth => ExtendedKeyUsagePurpose::ServerAuth,
                ExtendedKeyUsage::ClientAuth => ExtendedKeyUsagePurpose::ClientAuth,
            })
            .collect();

        let (not_before, not_after) = compute_validity(self.validity_days)?;
        params.not_before = not_before;
        params.not_after = not_after;

        params.subject_alt_names = self
            .alternative_names
            .iter()
            .map(|san| {
                if let Ok(ip) = san.parse::<std::net::IpAddr>() {
                    Ok(SanType::IpAddress(ip))
                } else {
                    Ia5String::try_from(san.clone())
                        .map(SanType::DnsName)
                        .map_err(|_| PkiError::InvalidSubjectAltName(san.clone()))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(params)
    }
}

fn generate_key() -> Result<KeyPair> {
    KeyPair::generate().map_err(|e| PkiError::KeyGeneration(e.to_string()))
}

/// Issue a self-signed certificate (a root CA when `profile.is_ca`).
pub fn self_sign(profile: &CertificateProfile) -> Result<IssuedCertificate> {
    let params = profile.to_params()?;
    let key = generate_key()?;

    let cert = params
        .self_signed(&key)
        .map_err(|e| PkiError::CertificateGeneration(format!("failed to self-sign: {}", e)))?;

    Ok(IssuedCertificate {
        certificate_pem: cert.pem(),
        private_key_pem: key.serialize_pem(),
    })
}

/// Issue a certificate signed by the given CA certificate and key.
pub fn sign(
    profile: &CertificateProfile,
    issuer_cert_pem: &str,
    issuer_key_pem: &str,
) -> Result<IssuedCertificate> {
    let mut params = profile.to_params()?;
    params.use_authority_key_identifier_extension = true;

    let issuer_key = KeyPair::from_pem(issuer_key_pem)
        .map_err(|e| PkiError::Parse(format!("failed to load issuer key: {}", e)))?;
    let issuer = Issuer::from_ca_cert_pem(issuer_cert_pem, &issuer_key)
        .map_err(|e| PkiError::Parse(format!("failed to load issuer certificate: {}", e)))?;

    let key = generate_key()?;
    let cert = params
        .signed_by(&key, &issuer)
        .map_err(|e| PkiError::CertificateGeneration(format!("failed to sign: {}", e)))?;

    Ok(IssuedCertificate {
        certificate_pem: cert.pem(),
        private_key_pem: key.serialize_pem(),
    })
}

/// Summary of the fields the generator and its callers care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub common_name: String,
    pub issuer_common_name: String,
    pub organization: Option<String>,
    pub issuer_country: Option<String>,
    pub is_ca: bool,
    pub subject_key_id: Option<Vec<u8>>,
    pub authority_key_id: Option<Vec<u8>>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<std::net::IpAddr>,
    pub server_auth: bool,
    pub client_auth: bool,
    /// Unix timestamps
    pub not_before: i64,
    pub not_after: i64,
}

fn first_cn(name: &X509Name<'_>) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or("")
        .to_string()
}

impl CertificateInfo {
    pub fn from_pem(pem_data: &str) -> Result<Self> {
        let der = parse_pem(pem_data)?;
        Self::from_der(&der)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| PkiError::Parse(format!("failed to parse certificate: {}", e)))?;

        let organization = cert
            .subject()
            .iter_organization()
            .next()
            .and_then(|o| o.as_str().ok())
            .map(str::to_string);
        let issuer_country = cert
            .issuer()
            .iter_country()
            .next()
            .and_then(|c| c.as_str().ok())
            .map(str::to_string);

        let is_ca = cert
            .basic_constraints()
            .ok()
            .flatten()
            .map(|bc| bc.value.ca)
            .unwrap_or(false);

        let mut subject_key_id = None;
        let mut authority_key_id = None;
        for ext in cert.extensions() {
            match ext.parsed_extension() {
                ParsedExtension::SubjectKeyIdentifier(ski) => subject_key_id = Some(ski.0.to_vec()),
                ParsedExtension::AuthorityKeyIdentifier(aki) => {
                    authority_key_id = aki.key_identifier.as_ref().map(|k| k.0.to_vec())
                }
                _ => {}
            }
        }

        let mut dns_names = Vec::new();
        let mut ip_addresses = Vec::new();
        if let Ok(Some(san)) = cert.subject_alternative_name() {
            for name in &san.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
                    GeneralName::IPAddress(bytes) => {
                        if let Ok(octets) = <[u8; 4]>::try_from(*bytes) {
                            ip_addresses.push(std::net::IpAddr::from(octets));
                        } else if let Ok(octets) = <[u8; 16]>::try_from(*bytes) {
                            ip_addresses.push(std::net::IpAddr::from(octets));
                        }
                    }
                    _ => {}
                }
            }
        }

        let (server_auth, client_auth) = match cert.extended_key_usage() {
            Ok(Some(eku)) => (eku.value.server_auth, eku.value.client_auth),
            _ => (false, false),
        };

        Ok(Self {
            common_name: first_cn(cert.subject()),
            issuer_common_name: first_cn(cert.issuer()),
            organization,
            issuer_country,
            is_ca,
            subject_key_id,
            authority_key_id,
            dns_names,
            ip_addresses,
            server_auth,
            client_auth,
            not_before: cert.validity().not_before.timestamp(),
            not_after: cert.validity().not_after.timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(cn: &str, is_ca: bool) -> CertificateProfile {
        CertificateProfile {
            common_name: cn.to_string(),
            organization: "Cloud Foundry".to_string(),
            country: "USA".to_string(),
            validity_days: 365,
            is_ca,
            alternative_names: vec![],
            extended_key_usage: vec![],
        }
    }

    #[test]
    fn test_self_signed_root() {
        let root = self_sign(&profile("my-root", true)).unwrap();
        let info = CertificateInfo::from_pem(&root.certificate_pem).unwrap();

        assert_eq!(info.common_name, "my-root");
        assert_eq!(info.issuer_common_name, "my-root");
        assert_eq!(info.organization.as_deref(), Some("Cloud Foundry"));
        assert_eq!(info.issuer_country.as_deref(), Some("USA"));
        assert!(info.is_ca);
        assert!(info.subject_key_id.is_some());
        assert!(info.dns_names.is_empty());
        assert!(KeyPair::from_pem(&root.private_key_pem).is_ok());
    }

    #[test]
    fn test_validity_window() {
        let mut short = profile("short", true);
        short.validity_days = 30;
        let info = CertificateInfo::from_pem(&self_sign(&short).unwrap().certificate_pem).unwrap();

        let span = info.not_after - info.not_before;
        assert!((span - 30 * 86_400).abs() <= 1);
    }

    #[test]
    fn test_unrepresentable_validity_is_an_error() {
        let mut forever = profile("forever", true);
        forever.validity_days = 4_000_000;
        assert!(matches!(self_sign(&forever), Err(PkiError::CertificateGeneration(_))));
    }

    #[test]
    fn test_chain_links_aki_to_parent_ski() {
        let root = self_sign(&profile("root", true)).unwrap();
        let intermediate =
            sign(&profile("intermediate", true), &root.certificate_pem, &root.private_key_pem).unwrap();

        let mut leaf_profile = profile("leaf", false);
        leaf_profile.alternative_names = vec!["signed-an1".to_string(), "10.0.0.1".to_string()];
        leaf_profile.extended_key_usage = vec![ExtendedKeyUsage::ServerAuth];
        let leaf = sign(
            &leaf_profile,
            &intermediate.certificate_pem,
            &intermediate.private_key_pem,
        )
        .unwrap();

        let root_info = CertificateInfo::from_pem(&root.certificate_pem).unwrap();
        let int_info = CertificateInfo::from_pem(&intermediate.certificate_pem).unwrap();
        let leaf_info = CertificateInfo::from_pem(&leaf.certificate_pem).unwrap();

        assert!(int_info.is_ca);
        assert_eq!(int_info.issuer_common_name, "root");
        assert_eq!(int_info.authority_key_id, root_info.subject_key_id);
        assert_ne!(int_info.subject_key_id, root_info.subject_key_id);

        assert!(!leaf_info.is_ca);
        assert_eq!(leaf_info.issuer_common_name, "intermediate");
        assert_eq!(leaf_info.authority_key_id, int_info.subject_key_id);
        assert_eq!(leaf_info.dns_names, vec!["signed-an1".to_string()]);
        assert_eq!(
            leaf_info.ip_addresses,
            vec!["10.0.0.1".parse::<std::net::IpAddr>().unwrap()]
        );
        assert!(leaf_info.server_auth);
        assert!(!leaf_info.client_auth);
    }

    #[test]
    fn test_sign_rejects_garbage_issuer() {
        let result = sign(&profile("leaf", false), "not a pem", "not a key");
        assert!(matches!(result, Err(PkiError::Parse(_))));
    }

    #[test]
    fn test_invalid_dns_name() {
        let mut bad = profile("leaf", false);
        bad.alternative_names = vec!["bücher.example".to_string()];
        assert!(matches!(self_sign(&bad), Err(PkiError::InvalidSubjectAltName(_))));
    }

    #[test]
    fn test_pki_error_maps_to_generation() {
        let err: ConfigServerError = PkiError::KeyGeneration("boom".to_string()).into();
        assert!(matches!(err, ConfigServerError::Generation(_)));
    }
}
