// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Config server CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Process wiring for the HTTP server and configuration commands

pub mod commands;
pub mod server;
