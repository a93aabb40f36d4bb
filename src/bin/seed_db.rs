use domain::hardware_loader::{self, LoadOutcome, LoaderSettings};
use log::{error, info};
use service::{config::Config, logging::Logger};

/// Runs the hardware loader once against an already migrated database.
///
/// Exits with 0 when the data was loaded or there was nothing to do, and with 1
/// when the connection could not be opened or the load was rolled back.
#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Seeding hardware data [{}]...", config.database_url());

    let db = match service::init_seed_connection(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let outcome = hardware_loader::run(&db, &LoaderSettings::from(&config)).await;

    if let Err(e) = db.close().await {
        error!("Failed to close database connection: {e}");
    }

    if let LoadOutcome::Failed(_) = outcome {
        std::process::exit(1);
    }
}
