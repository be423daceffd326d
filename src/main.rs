//! Atelier Storefront - fashion storefront HTTP service

use anyhow::Result;
use atelier_storefront::config::{AppConfig, StoreBackend};
use atelier_storefront::persistence::{JsonFileStore, MemoryStore, StorefrontStore};
use atelier_storefront::{api, Catalog, Storefront};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let catalog = Arc::new(Catalog::load(config.catalog_path.as_deref())?);
    let store: Arc<dyn StorefrontStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(JsonFileStore::open(&config.store_dir)?),
    };
    tracing::info!(products = catalog.len(), backend = ?config.store_backend, "storefront initialised");

    let storefront = Arc::new(Storefront::new(catalog, store, config.shipping));
    let app = api::router(storefront);

    let addr = config.bind_addr();
    tracing::info!("Atelier Storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
