//! Catalogue API - read-only sock catalogue over REST

use axum_helpers::server::{create_production_app, create_router};
use core_config::tracing::{init_tracing, install_color_eyre, shutdown_tracing};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment, config.app.name);

    if config.metrics_enabled {
        observability::init_metrics()?;
    }

    info!(
        app = config.app.name,
        version = config.app.version,
        store = %config.store,
        "Starting Catalogue API"
    );

    let state = AppState::build(config).await?;

    info!(
        path = %state.config.images_path.display(),
        files = api::catalogue::count_images(&state),
        "Serving catalogue images"
    );

    let api_routes = api::routes(&state);
    let router = create_router::<openapi::ApiDoc>(
        api_routes,
        state.config.cors_origins.as_deref(),
        &state.config.environment,
    )?;

    let db = state.db.clone();
    let served = create_production_app(router, &state.config.server, async move {
        if let Some(db) = db {
            info!("Shutting down: closing PostgreSQL connections");
            if let Err(e) = db.close().await {
                tracing::warn!(error = %e, "Failed to close PostgreSQL pool cleanly");
            }
        }
    })
    .await;

    shutdown_tracing();
    served?;

    info!("Catalogue API shutdown complete");
    Ok(())
}
