use domain::hardware_loader::{self, LoadSummary, LoaderSettings};
use log::{error, info, warn};
use migration::{Migrator, MigratorTrait};
use service::{config::Config, logging::Logger, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Starting benchmarkinator [{}]...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(config, &db);

    if let Err(e) = Migrator::up(app_state.db_conn_ref(), None).await {
        error!("Failed to apply schema migrations: {e}");
        std::process::exit(1);
    }
    info!("Schema migrations applied");

    // Seeding problems are logged by the loader and never stop start-up.
    match seed_hardware(&app_state).await {
        Some(summary) => info!(
            "Hardware catalog seeded with era '{}' ({} statements)",
            summary.era, summary.statements
        ),
        None => info!("Hardware catalog left unchanged"),
    }

    info!("Startup complete");
}

async fn seed_hardware(app_state: &AppState) -> Option<LoadSummary> {
    let settings = LoaderSettings::from(&app_state.config);

    if !settings.enabled {
        return hardware_loader::run_if_enabled(app_state.db_conn_ref(), &settings).await;
    }

    let seed_db = match service::init_seed_connection(&app_state.config).await {
        Ok(seed_db) => seed_db,
        Err(e) => {
            error!("Failed to open hardware seed connection, skipping seeding: {e}");
            return None;
        }
    };

    let summary = hardware_loader::run_if_enabled(&seed_db, &settings).await;

    if let Err(e) = seed_db.close().await {
        warn!("Failed to close hardware seed connection: {e}");
    }

    summary
}
