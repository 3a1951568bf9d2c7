//! ServerBuilder for fluent API to build the HTTP server

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::service::CatalogService;
use crate::core::store::CatalogStore;
use crate::server::handlers::AppState;
use crate::server::router::build_router;

/// Builder for creating the catalog HTTP server
///
/// # Example
///
/// ```ignore
/// ServerBuilder::new()
///     .with_store(InMemoryCatalog::new())
///     .serve("127.0.0.1:8000")
///     .await?;
/// ```
pub struct ServerBuilder {
    store: Option<Arc<dyn CatalogStore>>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self { store: None }
    }

    /// Set the storage backend (required)
    pub fn with_store(mut self, store: impl CatalogStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set the storage backend from an already-shared handle
    pub fn with_shared_store(mut self, store: Arc<dyn CatalogStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the final router
    pub fn build(self) -> Result<Router> {
        let store = self
            .store
            .ok_or_else(|| anyhow::anyhow!("a CatalogStore is required. Call .with_store()"))?;

        let state = AppState {
            catalog: CatalogService::new(store),
        };
        Ok(build_router(state))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
