//! Catalog server binary: resolve configuration, pick the storage backend,
//! and serve.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use carte::config::{AppConfig, StoreBackend};
use carte::core::store::CatalogStore;
use carte::server::ServerBuilder;
use carte::storage::InMemoryCatalog;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,carte=debug".to_string()),
        )
        .init();

    let config = AppConfig::from_env()?;

    let store = build_store(&config).await?;

    ServerBuilder::new()
        .with_shared_store(store)
        .serve(&config.listen_addr)
        .await
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn CatalogStore>> {
    match &config.store {
        StoreBackend::Memory => {
            info!("using in-memory store");
            Ok(Arc::new(InMemoryCatalog::new()))
        }

        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite { path } => {
            info!(path = %path.display(), "using sqlite store");
            Ok(Arc::new(carte::storage::SqliteCatalog::connect(path).await?))
        }
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite { .. } => {
            anyhow::bail!("DB_ENGINE=SQLITE requires building with the `sqlite` feature")
        }

        #[cfg(feature = "postgres")]
        StoreBackend::Postgres(settings) => {
            info!(service = %settings.service, database = %settings.database, "using postgres store");
            Ok(Arc::new(
                carte::storage::PostgresCatalog::connect(&settings.url()).await?,
            ))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres(_) => {
            anyhow::bail!("DB_ENGINE=POSTGRESQL requires building with the `postgres` feature")
        }
    }
}
