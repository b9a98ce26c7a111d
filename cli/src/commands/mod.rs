// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the config server CLI

pub mod config;

pub use self::config::ConfigCommand;
