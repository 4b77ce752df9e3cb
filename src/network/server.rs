//! HTTP Server
//!
//! Binds the listener and serves the router until shutdown.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::error::{Result, VoteError};

use super::router;

/// HTTP server for votekv
pub struct Server {
    config: Config,
    coordinator: Arc<Coordinator>,
}

impl Server {
    /// Create a new server with the given config and coordinator
    pub fn new(config: Config, coordinator: Arc<Coordinator>) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` completes
    ///
    /// Open event streams are ended when shutdown starts so in-flight
    /// connections can drain.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(&self.config, Arc::clone(&self.coordinator))?;

        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .map_err(|e| {
                VoteError::Network(format!("failed to bind {}: {}", self.config.listen_addr, e))
            })?;

        let local_addr = listener.local_addr()?;
        tracing::info!("Server running on http://{}", local_addr);

        let notifier = self.coordinator.notifier().clone();
        let shutdown = async move {
            shutdown.await;
            notifier.detach_all();
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| VoteError::Network(e.to_string()))?;

        tracing::info!("Server shutting down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
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
