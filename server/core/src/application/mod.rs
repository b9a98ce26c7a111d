// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod convergence;
pub mod generator;
pub mod store_factory;

pub use convergence::ConvergenceController;
pub use generator::CredentialGenerator;
pub use store_factory::create_configuration_store;
