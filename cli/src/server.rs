// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! HTTP server wiring

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use config_server_core::application::create_configuration_store;
use config_server_core::domain::server_config::ServerConfigManifest;
use config_server_core::presentation::{app, AppState, JwtVerifier};

/// Build the router described by `manifest`.
pub fn build_router(manifest: &ServerConfigManifest) -> Result<Router> {
    let store = create_configuration_store(&manifest.spec.store)
        .context("Failed to open configuration store")?;

    let verifier = JwtVerifier::from_config(&manifest.spec.authentication)
        .context("Failed to initialize token verification")?;
    if verifier.is_none() {
        warn!("No JWT verification key configured; /v1 routes accept unauthenticated requests");
    }

    Ok(app(AppState::new(
        store,
        manifest.spec.certificates.clone(),
        verifier,
    )))
}

pub async fn start_server(manifest: ServerConfigManifest) -> Result<()> {
    manifest
        .validate()
        .context("Configuration validation failed")?;

    info!(store = ?manifest.spec.store, "Configuration loaded");
    let router = build_router(&manifest)?;

    let addr = format!(
        "{}:{}",
        manifest.spec.server.bind_address, manifest.spec.server.port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Config server listening on {}", addr);
    serve(listener, router).await
}

/// Serve until SIGINT/SIGTERM.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Config server shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
