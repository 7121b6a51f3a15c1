use axum_helpers::server::{close_postgres, create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::{connect_from_config_with_retry, run_migrations};
use migration::Migrator;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    info!(
        name = config.app.name,
        version = config.app.version,
        store = %config.store,
        "Starting inventory API"
    );

    let db = match &config.database {
        Some(postgres) => {
            let db = connect_from_config_with_retry(postgres.clone(), None)
                .await
                .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

            if config.run_migrations {
                run_migrations::<Migrator>(&db, config.app.name)
                    .await
                    .map_err(|e| eyre::eyre!("Migration failed: {}", e))?;
            }

            Some(db)
        }
        None => {
            warn!("Using the in-memory product store, data is lost on restart");
            None
        }
    };

    let state = AppState { config, db };

    // create_router adds docs/middleware to our composed routes
    let router = create_router::<openapi::ApiDoc>(
        api::routes(&state),
        state.config.cors_origins.clone(),
    )?;

    // - /health: liveness check with app name/version
    // - /ready: readiness check that pings the database
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    let server = state.config.server.clone();

    info!("Starting inventory API with graceful shutdown (30s timeout)");

    create_production_app(app, &server, Duration::from_secs(30), async move {
        if let Some(db) = state.db {
            info!("Shutting down: closing database connections");
            close_postgres(db, "inventory").await;
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Inventory API shutdown complete");
    Ok(())
}
