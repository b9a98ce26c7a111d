// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # Config Server
//!
//! The `config-server` binary serves the versioned credential store over HTTP.
//!
//! ## Commands
//!
//! - `config-server [FILE]` - serve with the given (or discovered) configuration
//! - `config-server serve [FILE]` - same, spelled out
//! - `config-server config show|validate|generate` - configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use config_server::commands::{self, ConfigCommand};
use config_server::server;
use config_server_core::domain::server_config::ServerConfigManifest;

/// Versioned configuration and credential store
#[derive(Parser)]
#[command(name = "config-server")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true, args_conflicts_with_subcommands = true)]
struct Cli {
    /// Configuration file to serve with
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "CONFIG_SERVER_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true, env = "CONFIG_SERVER_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    #[command(name = "serve")]
    Serve {
        /// Configuration file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config { command }) => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "text")?;
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Serve { file }) => serve(file.or(cli.config), cli.log_level).await,
        None => serve(cli.file.or(cli.config), cli.log_level).await,
    }
}

/// Level used while the manifest is loading, before its own level is known.
const BOOTSTRAP_LOG_LEVEL: &str = "info";

async fn serve(config_path: Option<PathBuf>, log_level: Option<String>) -> Result<()> {
    let manifest = load_manifest(config_path, log_level.as_deref(), std::io::stderr)?;

    let logging = &manifest.spec.observability.logging;
    init_logging(log_level.as_deref().unwrap_or(&logging.level), &logging.format)?;

    info!(name = %manifest.metadata.name, "Starting config server");
    server::start_server(manifest).await
}

/// Load the manifest under a scoped text subscriber.
///
/// The global subscriber can only be installed once and its format comes from
/// the manifest, so loading messages (path, env overrides) go through this
/// temporary one instead of being dropped.
fn load_manifest<W>(config_path: Option<PathBuf>, log_level: Option<&str>, writer: W) -> Result<ServerConfigManifest>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(log_level.unwrap_or(BOOTSTRAP_LOG_LEVEL))?)
        .with_target(false)
        .with_writer(writer)
        .compact()
        .finish();

    tracing::subscriber::with_default(subscriber, || ServerConfigManifest::load_or_default(config_path))
        .context("Failed to load configuration")
}

/// `RUST_LOG` wins over the given level.
fn log_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to create log filter")
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = log_filter(level)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
