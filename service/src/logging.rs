use crate::config::Config;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Modules to filter out from logging when not in Trace mode.
/// Database driver and migration chatter drowns out the start-up sequence otherwise.
const FILTERED_MODULES: &[&str] = &["sqlx", "sea_orm", "sea_orm_migration", "tracing"];

pub struct Logger {}

impl Logger {
    /// Initializes the global terminal logger at the level given by `config`.
    ///
    /// Below Trace, dependency logs are filtered out. Calling this a second time
    /// keeps the first logger and reports the attempt on stderr.
    pub fn init_logger(config: &Config) {
        Self::init_with_level(config.log_level_filter);
    }

    pub fn init_with_level(level: LevelFilter) {
        let log_config = Self::build_log_config(Self::should_filter_dependencies(level));

        if let Err(err) = TermLogger::init(level, log_config, TerminalMode::Mixed, ColorChoice::Auto)
        {
            eprintln!("Logger already initialized, keeping the existing one: {err}");
        }
    }

    /// Returns `false` for Trace level (show all logs), `true` for all other levels.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    /// Builds a simplelog Config with RFC3339 timestamps, optionally ignoring
    /// [`FILTERED_MODULES`].
    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
