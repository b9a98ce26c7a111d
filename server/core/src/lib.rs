// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Config Server Core
//!
//! Versioned credential store and credential generation engine.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, store backends, generation engine and the HTTP surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
