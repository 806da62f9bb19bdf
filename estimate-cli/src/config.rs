//! `estimator.toml` settings.
//!
//! ```toml
//! hourly_rate = 100
//! log_level = "info"
//! log_file = "estimator.log"
//!
//! [store]
//! backend = "sqlite"
//! connection_string = "estimates.db"
//! ```
//!
//! Every key is optional. Command-line flags win over file values.

use std::fs;
use std::path::{Path, PathBuf};

use estimate_core::db::StoreConfig;
use estimate_core::{CostConfig, CostConfigError, DEFAULT_HOURLY_RATE};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

/// File read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "estimator.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Cost(#[from] CostConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub hourly_rate: Decimal,
    #[serde(deserialize_with = "store_over_default")]
    pub store: StoreConfig,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hourly_rate: DEFAULT_HOURLY_RATE,
            store: default_store(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// The CLI persists to a SQLite file unless told otherwise.
fn default_store() -> StoreConfig {
    StoreConfig {
        backend: "sqlite".to_string(),
        connection_string: "estimates.db".to_string(),
    }
}

/// `[store]` as written in the file. Keys left out fall back to
/// [`default_store`], not to [`StoreConfig::default`].
#[derive(Deserialize)]
struct StoreTable {
    backend: Option<String>,
    connection_string: Option<String>,
}

fn store_over_default<'de, D>(deserializer: D) -> Result<StoreConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let table = StoreTable::deserialize(deserializer)?;
    let defaults = default_store();
    Ok(StoreConfig {
        backend: table.backend.unwrap_or(defaults.backend),
        connection_string: table.connection_string.unwrap_or(defaults.connection_string),
    })
}

/// Values given on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<String>,
    pub db: Option<String>,
    pub log_level: Option<String>,
    pub hourly_rate: Option<Decimal>,
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.cost_config()?;
        Ok(config)
    }

    /// Read `path`, or [`DEFAULT_CONFIG_FILE`] when `path` is `None`. A
    /// missing default file yields the built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            debug!("no {} found; using defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Self::from_toml_str(&text)
    }

    pub fn apply(
        mut self,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        if let Some(backend) = overrides.backend {
            self.store.backend = backend;
        }
        if let Some(db) = overrides.db {
            self.store.connection_string = db;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(rate) = overrides.hourly_rate {
            self.hourly_rate = rate;
        }
        self.cost_config()?;
        Ok(self)
    }

    pub fn cost_config(&self) -> Result<CostConfig, CostConfigError> {
        CostConfig::new(self.hourly_rate)
    }
}
