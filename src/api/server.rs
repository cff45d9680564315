// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Service Shell
//!
//! Binds the listener, serves the router in the background, and drains on
//! shutdown. Model loading is driven by the caller through the shared
//! [`ModelHolder`]; until it reports ready the embedding routes answer 503.

use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::auth::AuthConfig;
use super::http_server::{create_app, AppState, RequestLimits};
use crate::embeddings::ModelHolder;

/// Port the service listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 3007;

/// Seconds allowed for in-flight requests to finish on shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_addr: SocketAddr,
    pub auth: AuthConfig,
    pub limits: RequestLimits,
    pub shutdown_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            auth: AuthConfig::open(),
            limits: RequestLimits::default(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

pub struct ApiServer {
    addr: SocketAddr,
    model: Arc<ModelHolder>,
    shutdown_timeout: Duration,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl ApiServer {
    /// Binds `config.listen_addr` and starts serving immediately.
    pub async fn bind(config: ApiConfig, model: Arc<ModelHolder>) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(config.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
        let addr = listener.local_addr()?;

        if config.auth.is_enabled() {
            info!("🔒 Bearer token authentication enabled");
        } else {
            warn!("⚠️  No auth token configured - service is open");
        }

        let app = create_app(
            AppState::new(model.clone(), config.limits),
            Arc::new(config.auth),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!("🌐 Embedding service listening on {}", addr);

        Ok(Self {
            addr,
            model,
            shutdown_timeout: config.shutdown_timeout,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn model(&self) -> &Arc<ModelHolder> {
        &self.model
    }

    /// Stops accepting connections and waits up to the configured timeout
    /// for in-flight requests; anything still running after that is
    /// abandoned.
    pub async fn shutdown(mut self) {
        info!("👋 Shutting down embedding service...");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        let Some(mut handle) = self.handle.take() else {
            return;
        };

        match tokio::time::timeout(self.shutdown_timeout, &mut handle).await {
            Ok(Ok(Ok(()))) => info!("✅ All connections drained"),
            Ok(Ok(Err(e))) => warn!("HTTP server exited with error: {}", e),
            Ok(Err(e)) => warn!("HTTP server task failed: {}", e),
            Err(_) => {
                warn!(
                    "⚠️  Drain exceeded {:?}, abandoning in-flight requests",
                    self.shutdown_timeout
                );
                handle.abort();
            }
        }
    }
}

/// Runs `service` on a dedicated multi-threaded runtime and tears the
/// runtime down afterwards.
///
/// Work on the blocking pool (a session build, an encode) cannot be
/// cancelled. Teardown waits at most `teardown_timeout` for it and then
/// leaves it behind, so a signal during model load still ends the process.
pub fn run_service<F>(teardown_timeout: Duration, service: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(service);
    runtime.shutdown_timeout(teardown_timeout);
    result
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
