//! One-time loader for the hardware catalog seed data.
//!
//! When enabled, the statements of every seed file mapped to the selected era
//! are executed inside one transaction, together with the settings flags that
//! mark the store as seeded. An advisory lock serializes concurrent workers, and
//! the flags make every run after the first successful one a no-op.

use service::config::Config;
use std::path::PathBuf;
use std::time::Duration;

mod era;
mod outcome;
mod runner;
pub mod statements;

pub use era::{Era, EraParseError};
pub use outcome::{LoadOutcome, LoadSummary, SkipReason};
pub use runner::{run, run_if_enabled};

/// Name of the advisory lock held while seeding.
pub const LOCK_NAME: &str = "benchmarkinator.hardware_loader";

/// Settings key holding `"true"` once the hardware data has been loaded.
pub const LOADED_KEY: &str = "hardware_data_loaded";
/// Settings key holding the canonical identifier of the loaded era.
pub const ERA_KEY: &str = "hardware_data_era";
/// Settings key holding the RFC3339 completion time of the load.
pub const LOADED_AT_KEY: &str = "hardware_data_loaded_at";

/// Inputs of a loader run, decoupled from process configuration.
#[derive(Clone, Debug)]
pub struct LoaderSettings {
    pub enabled: bool,
    /// Raw era selector; validated when the loader runs.
    pub era: Option<String>,
    pub seed_dir: PathBuf,
    pub lock_timeout: Duration,
}

impl From<&Config> for LoaderSettings {
    fn from(config: &Config) -> Self {
        Self {
            enabled: config.load_hardware_data(),
            era: config.hardware_era(),
            seed_dir: PathBuf::from(config.hardware_seed_dir()),
            lock_timeout: Duration::from_secs(config.hardware_seed_lock_timeout_secs),
        }
    }
}
