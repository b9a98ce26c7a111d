// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod api;
pub mod auth;

pub use api::{app, AppState};
pub use auth::JwtVerifier;
