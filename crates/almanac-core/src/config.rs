use anyhow::Result;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder};
use serde::Deserialize;

use crate::constants::{DEFAULT_MAX_DAYS_IN_FUTURE, DEFAULT_QUERY_WINDOW_MONTHS};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub query: QueryConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Length of the look-ahead window used by repeat queries.
    pub default_window_months: u32,
    /// Suggested dates further ahead than this are treated as expired.
    pub max_days_in_future: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// JSON schedule document loaded at startup.
    pub schedules_path: Option<String>,
    /// Expose festival days as read-only schedules.
    pub festival_overlay: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            query: QueryConfig {
                default_window_months: DEFAULT_QUERY_WINDOW_MONTHS,
                max_days_in_future: DEFAULT_MAX_DAYS_IN_FUTURE,
            },
            store: StoreConfig {
                schedules_path: None,
                festival_overlay: true,
            },
        }
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("logging.level", "info")?
        .set_default(
            "query.default_window_months",
            i64::from(DEFAULT_QUERY_WINDOW_MONTHS),
        )?
        .set_default("query.max_days_in_future", DEFAULT_MAX_DAYS_IN_FUTURE)?
        .set_default("store.festival_overlay", true)?)
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `config.toml` and `ALMANAC__*` environment
    /// variables into a `Settings`. Environment variables take precedence.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(with_defaults()?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env, e.g. ALMANAC__QUERY__MAX_DAYS_IN_FUTURE=90
            .add_source(
                config::Environment::with_prefix("ALMANAC")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Builds settings from an in-memory TOML document layered over the defaults.
    ///
    /// ## Errors
    /// Returns an error if the document is not valid TOML or has mistyped fields.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(with_defaults()?
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    tracing::debug!(settings = ?settings, "Configuration resolved");
    Ok(settings)
}
