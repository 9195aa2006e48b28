//! Node configuration for the Arbibots applier.
//!
//! [`NodeConfig`] is layered with the `config` crate: built-in defaults, then
//! a TOML file, then `ARBI_*` environment variables. Nested keys use `__`,
//! e.g. `ARBI_COLLECTION__POOL_COUNT=5` or `ARBI_COLLECTION__START_PRICE=2.5`.
//!
//! Prices in the TOML file are decimal strings (`start_price = "2.5"`) or
//! whole integers (`start_price = 20`). Float literals are rejected.

use std::path::{Path, PathBuf};

use arbi_core::constants::DEFAULT_EVENT_CAPACITY;
use arbi_core::types::CollectionParams;
use config::{Config, ConfigError, Environment, File, FileFormat, FileSourceFile};
use serde::{Deserialize, Serialize};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ARBI";

/// Configuration for an applier instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    /// Collection parameters; amounts are decimal coin strings.
    pub collection: CollectionParams,
    /// CSV allowlist for companion issuance. No companion ids qualify when unset.
    pub allowlist_path: Option<PathBuf>,
    /// Events buffered per subscriber before it starts lagging.
    pub event_capacity: usize,
    /// Log level filter string (e.g. "info", "debug", "arbi_core=trace").
    pub log_level: String,
    /// "text" or "json".
    pub log_format: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            collection: CollectionParams::default(),
            allowlist_path: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl NodeConfig {
    /// Standard location of the config file, `<config dir>/arbi/arbi.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("arbi")
            .join("arbi.toml")
    }

    /// Load defaults, then `path` (must exist) or the standard file (if
    /// present), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::from(Self::default_path()).required(false),
        };
        Self::load_from(file, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(
        file: File<FileSourceFile, FileFormat>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let cfg: Self = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(env.prefix_separator("_").separator("__"))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply command-line overrides of the log settings, then re-validate.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        log_format: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        if let Some(format) = log_format {
            self.log_format = format;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject parameters the collection cannot be opened with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collection
            .validate()
            .map_err(|e| ConfigError::Message(format!("collection: {e}")))?;
        if self.event_capacity == 0 {
            return Err(ConfigError::Message("event_capacity must be positive".into()));
        }
        match self.log_format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::Message(format!(
                "log_format must be \"text\" or \"json\", got {other:?}"
            ))),
        }
    }
}
