// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Name Validator Domain Service
//!
//! Names address a version history and may contain only ASCII letters,
//! digits, underscores, dashes and forward slashes. Ids are opaque and are
//! never passed through this check.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Character-set predicate applied at every name-taking entry point

use crate::domain::error::ConfigServerError;

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '/'
}

/// Validate a configuration name.
///
/// # Examples
/// ```
/// use config_server_core::domain::name::validate;
///
/// assert!(validate("smurf/gar_gamel/c-at").is_ok());
/// assert!(validate("sm!urf/garg$amel/cat").is_err());
/// ```
pub fn validate(name: &str) -> Result<(), ConfigServerError> {
    if !name.is_empty() && name.chars().all(is_name_char) {
        return Ok(());
    }

    tracing::warn!(name = %name, "Rejected configuration name");
    Err(ConfigServerError::InvalidName)
}
