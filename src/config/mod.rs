// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{EcoChatError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest, prefix `ECOCHAT_`, nested with `__`)
    /// 2. Config file (`path`, or `~/.ecochat/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            // An explicitly named file has to exist
            Some(p) => File::from(p.to_path_buf()).required(true),
            None => File::from(Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("ECOCHAT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| EcoChatError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| EcoChatError::Config(e.to_string()))
    }

    /// Render the effective configuration as TOML, for `ecochat config`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EcoChatError::Internal(e.to_string()))
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ecochat")
            .join("config.toml")
    }
}
