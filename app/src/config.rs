//! Configuration management for the tile grid binary.
//!
//! Loads configuration from `TILEGRID_*` environment variables with sensible
//! defaults. Grid styling can additionally come from a JSON file named by
//! `TILEGRID_GRID_CONFIG`; `TILEGRID_COLUMNS` overrides its column count.

use crate::grid::GridConfig;
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tilegrid_runtime::StoreConfig;

/// Default location of the saved state file
pub const DEFAULT_STATE_PATH: &str = "tilegrid-state.json";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A variable was set to a value that cannot be used
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
        /// What is wrong with it
        reason: String,
    },

    /// The grid config file could not be read
    #[error("Could not read {}: {source}", path.display())]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The grid config file is not valid JSON for [`GridConfig`]
    #[error("Could not parse {}: {source}", path.display())]
    Parse {
        /// File that was being parsed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Where the tile count is saved (`TILEGRID_STATE_PATH`)
    pub state_path: PathBuf,
    /// Whether tiles are painted with ANSI colours (`TILEGRID_COLOR`)
    pub color: bool,
    /// Failed writes kept for inspection (`TILEGRID_DLQ_MAX_SIZE`)
    pub dlq_max_size: usize,
    /// Grid appearance (`TILEGRID_GRID_CONFIG`, `TILEGRID_COLUMNS`)
    pub grid: GridConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            color: true,
            dlq_max_size: StoreConfig::DEFAULT_DLQ_MAX_SIZE,
            grid: GridConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable holds an unusable value or the
    /// grid config file cannot be loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let state_path = lookup("TILEGRID_STATE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map_or(defaults.state_path, PathBuf::from);

        let color = match lookup("TILEGRID_COLOR") {
            Some(value) => parse_bool("TILEGRID_COLOR", &value)?,
            None => defaults.color,
        };

        let dlq_max_size = match lookup("TILEGRID_DLQ_MAX_SIZE") {
            Some(value) => parse_number("TILEGRID_DLQ_MAX_SIZE", &value)?,
            None => defaults.dlq_max_size,
        };

        let mut grid = match lookup("TILEGRID_GRID_CONFIG") {
            Some(path) => load_grid(PathBuf::from(path))?,
            None => defaults.grid,
        };

        if let Some(value) = lookup("TILEGRID_COLUMNS") {
            let columns = parse_number("TILEGRID_COLUMNS", &value)?;
            if columns == 0 {
                return Err(ConfigError::Invalid {
                    key: "TILEGRID_COLUMNS",
                    value,
                    reason: "must be at least 1".to_string(),
                });
            }
            grid.columns = columns;
        }

        Ok(Self {
            state_path,
            color,
            dlq_max_size,
            grid,
        })
    }

    /// Runtime settings derived from this configuration
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default().with_dlq_max_size(self.dlq_max_size)
    }
}

fn load_grid(path: PathBuf) -> Result<GridConfig, ConfigError> {
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(source) => return Err(ConfigError::Io { path, source }),
    };
    // Defaulted structs also deserialize from arrays; only an object is a config
    let object: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(&text) {
        Ok(object) => object,
        Err(source) => return Err(ConfigError::Parse { path, source }),
    };
    serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|source| ConfigError::Parse { path, source })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
