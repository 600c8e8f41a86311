//! Application state management

use database::postgres::DatabaseConnection;
use domain_catalogue::{
    CatalogueService, CatalogueServiceImpl, InstrumentedCatalogue, LoggingCatalogue,
    MemorySockStore, PgSockStore, Sock,
};
use eyre::{eyre, WrapErr};
use observability::CatalogueMetrics;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, StoreBackend};

/// Catalogue shipped with the binary, used when no seed file is configured
const BUNDLED_SEED: &str = include_str!("../data/socks.json");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub service: Arc<dyn CatalogueService>,
    /// Open pool for the postgres backend, closed on shutdown
    pub db: Option<DatabaseConnection>,
}

impl AppState {
    /// Open the configured store and wrap the service in its decorators.
    pub async fn build(config: Config) -> eyre::Result<Self> {
        let seed = load_seed(config.seed_file.as_deref())?;

        match config.store {
            StoreBackend::Memory => {
                let store = MemorySockStore::new(seed).wrap_err("Invalid catalogue seed")?;
                CatalogueMetrics::set_catalogue_size(store.len());
                info!(socks = store.len(), "Using in-memory sock store");

                let service = decorate(CatalogueServiceImpl::new(store), config.metrics_enabled);
                Ok(Self {
                    config,
                    service,
                    db: None,
                })
            }
            StoreBackend::Postgres => {
                let pg_config = config
                    .postgres
                    .clone()
                    .ok_or_else(|| eyre!("postgres backend selected without DATABASE_URL"))?;

                let db = database::postgres::connect_from_config_with_retry(pg_config, None).await?;
                info!("Successfully connected to PostgreSQL");

                let store = PgSockStore::new(db.clone());
                store.init_schema().await?;
                let inserted = store.seed_if_empty(&seed).await?;
                if inserted == 0 {
                    info!("Socks table already populated, skipping seed");
                }

                let service = decorate(CatalogueServiceImpl::new(store), config.metrics_enabled);
                Ok(Self {
                    config,
                    service,
                    db: Some(db),
                })
            }
        }
    }
}

fn decorate<S>(service: S, metrics_enabled: bool) -> Arc<dyn CatalogueService>
where
    S: CatalogueService + 'static,
{
    if metrics_enabled {
        let instrumented = InstrumentedCatalogue::new(Arc::new(service));
        Arc::new(LoggingCatalogue::new(Arc::new(instrumented)))
    } else {
        Arc::new(LoggingCatalogue::new(Arc::new(service)))
    }
}

fn load_seed(path: Option<&Path>) -> eyre::Result<Vec<Sock>> {
    let socks: Vec<Sock> = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read seed file {}", path.display()))?;
            serde_json::from_str(&json)
                .wrap_err_with(|| format!("Malformed seed file {}", path.display()))?
        }
        None => serde_json::from_str(BUNDLED_SEED).wrap_err("Malformed bundled catalogue")?,
    };

    info!(socks = socks.len(), "Loaded catalogue seed");
    Ok(socks)
}
