// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level service runner — shared by `main` and integration tests.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::retention::RetentionWorker;
use crate::transport::{build_router, AppState};

/// Initialize tracing/logging from config.
///
/// Uses `try_init` so it is safe to call more than once (e.g. from tests).
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

fn bind_address(listen_address: &str) -> String {
    if let Some(port) = listen_address.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        listen_address.to_string()
    }
}

/// Run the service to completion: bind the listener, spawn the retention
/// worker, and serve until `shutdown` is cancelled.
pub async fn run(config: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(config.clone()));

    let retention = RetentionWorker::new(
        state.registry.clone(),
        std::time::Duration::from_secs(config.retention_interval_secs),
        config.completed_ttl_secs,
        if config.idle_expiration_enabled() {
            config.idle_ttl_secs
        } else {
            0
        },
    );
    let retention_shutdown = shutdown.clone();
    tokio::spawn(async move {
        retention.run(retention_shutdown).await;
    });

    let router = build_router(state);
    let addr = bind_address(&config.listen_address);
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}

/// Install a SIGTERM/SIGINT handler that cancels `token` on the first signal.
pub fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => Some(s),
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                None
            }
        };
        let mut sigint = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()) {
            Ok(s) => Some(s),
            Err(e) => {
                error!("failed to install SIGINT handler: {e}");
                None
            }
        };
        tokio::select! {
            _ = async {
                match sigterm.as_mut() {
                    Some(s) => s.recv().await,
                    None => std::future::pending().await,
                }
            } => info!("received SIGTERM"),
            _ = async {
                match sigint.as_mut() {
                    Some(s) => s.recv().await,
                    None => std::future::pending().await,
                }
            } => info!("received SIGINT"),
        }
        token.cancel();
    });
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
