use std::sync::Arc;

use hlsrelay_api::{create_router, AppState};
use hlsrelay_core::{RelayService, Settings};
use tracing::{error, info};

/// HTTP server plus the relay it controls
pub struct RelayServer {
    settings: Settings,
    relay: Arc<RelayService>,
}

impl RelayServer {
    pub fn new(settings: Settings, relay: Arc<RelayService>) -> Self {
        Self { settings, relay }
    }

    /// Serve until a shutdown signal arrives or the listener fails. The relay
    /// is stopped on every exit path.
    pub async fn run(self) -> anyhow::Result<()> {
        let result = self.serve().await;
        if let Err(e) = &result {
            error!("HTTP server error: {}", e);
        }

        self.relay.shutdown().await;
        info!("hlsrelay stopped");
        result
    }

    async fn serve(&self) -> anyhow::Result<()> {
        let addr = self.settings.http_address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind HTTP address {addr}: {e}"))?;
        info!("HTTP server listening on {}", listener.local_addr()?);

        let app = create_router(AppState::new(
            Arc::clone(&self.relay),
            self.settings.paths.static_dir.clone(),
        ));

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_signal().await;
                info!("Shutdown signal received, starting graceful shutdown...");
            })
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C signal");
            }
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received SIGTERM signal");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
