// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Bearer token authentication for the `/v1` routes.
//!
//! Tokens are JWTs verified against a configured public key (or shared
//! secret for the HMAC family). Verification is skipped entirely when no key
//! is configured.

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::server_config::AuthenticationConfig;
use crate::presentation::api::{ApiError, AppState};

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier from PEM key material (raw bytes for HS* secrets).
    pub fn from_pem(
        algorithm: Algorithm,
        key: &[u8],
        audience: Option<&str>,
    ) -> std::result::Result<Self, jsonwebtoken::errors::Error> {
        let key = match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => DecodingKey::from_rsa_pem(key)?,
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(key)?,
            Algorithm::EdDSA => DecodingKey::from_ed_pem(key)?,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => DecodingKey::from_secret(key),
        };

        let mut validation = Validation::new(algorithm);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Ok(Self { key, validation })
    }

    /// `None` when the configuration names no verification key.
    pub fn from_config(config: &AuthenticationConfig) -> Result<Option<Self>> {
        let Some(path) = &config.jwt_verification_key_path else {
            return Ok(None);
        };

        let algorithm = Algorithm::from_str(&config.algorithm)
            .with_context(|| format!("Unsupported JWT algorithm '{}'", config.algorithm))?;
        let key = std::fs::read(path)
            .with_context(|| format!("Failed to read JWT verification key: {:?}", path))?;

        let verifier = Self::from_pem(algorithm, &key, config.audience.as_deref())
            .with_context(|| format!("Invalid JWT verification key: {:?}", path))?;
        Ok(Some(verifier))
    }

    pub fn verify(&self, token: &str) -> std::result::Result<serde_json::Value, jsonwebtoken::errors::Error> {
        decode::<serde_json::Value>(token, &self.key, &self.validation).map(|data| data.claims)
    }
}

/// Token of an `Authorization: Bearer <token>` header; the scheme is case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Reject `/v1` requests that lack a valid bearer token.
pub async fn require_bearer(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let Some(verifier) = state.verifier.as_ref() else {
        return next.run(request).await;
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);

    let Some(token) = token else {
        warn!(path = %request.uri().path(), "Request without bearer token");
        return ApiError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    match verifier.verify(token) {
        Ok(claims) => {
            debug!(sub = ?claims.get("sub"), "Authenticated request");
            next.run(request).await
        }
        Err(e) => {
            warn!(path = %request.uri().path(), error = %e, "Rejected bearer token");
            ApiError::Unauthorized("Invalid bearer token".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
    use serde_json::json;

    fn keys() -> (EncodingKey, JwtVerifier) {
        let key = rcgen::KeyPair::generate_for(&rcgen::PKCS_ED25519).unwrap();
        let encoding = EncodingKey::from_ed_pem(key.serialize_pem().as_bytes()).unwrap();
        let verifier = JwtVerifier::from_pem(Algorithm::EdDSA, key.public_key_pem().as_bytes(), None).unwrap();
        (encoding, verifier)
    }

    #[test]
    fn test_valid_token() {
        let (encoding, verifier) = keys();
        let claims = json!({"sub": "operator", "exp": get_current_timestamp() + 600});
        let token = encode(&Header::new(Algorithm::EdDSA), &claims, &encoding).unwrap();

        let verified = verifier.verify(&token).unwrap();
        assert_eq!(verified["sub"], "operator");
    }

    #[test]
    fn test_expired_and_foreign_tokens() {
        let (encoding, verifier) = keys();
        let expired = json!({"sub": "operator", "exp": get_current_timestamp() - 3600});
        let token = encode(&Header::new(Algorithm::EdDSA), &expired, &encoding).unwrap();
        assert!(verifier.verify(&token).is_err());

        let (other, _) = keys();
        let claims = json!({"sub": "operator", "exp": get_current_timestamp() + 600});
        let token = encode(&Header::new(Algorithm::EdDSA), &claims, &other).unwrap();
        assert!(verifier.verify(&token).is_err());

        assert!(verifier.verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[test]
    fn test_no_key_configured() {
        assert!(JwtVerifier::from_config(&AuthenticationConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_missing_key_file() {
        let config = AuthenticationConfig {
            jwt_verification_key_path: Some("/nonexistent/key.pem".into()),
            ..Default::default()
        };
        assert!(JwtVerifier::from_config(&config).is_err());
    }
}
