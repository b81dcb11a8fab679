//! Configuration management for the reproduction harness.
//!
//! Provides hierarchical configuration loading from multiple sources with priority:
//! 1. Default values (hardcoded)
//! 2. `config/default` and `config/local` files, when present
//! 3. The file named by `CONFIG_PATH`
//! 4. An explicit config file passed to [`Settings::load`]
//! 5. Environment variables (`RTDB__DATABASE__URL`, `RTDB__DATABASE__CERT`, ...)
//! 6. Command line overrides applied with [`Settings::with_database_overrides`]
//!

mod database;
mod emulator;
mod scenario;
pub use database::*;
pub use emulator::*;
pub use scenario::*;

#[cfg(test)]
mod config_test;

//---
use std::env;
use std::path::PathBuf;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Endpoint and credentials
    #[serde(default)]
    pub database: DatabaseConfig,
    /// In-process database timing
    #[serde(default)]
    pub emulator: EmulatorConfig,
    /// Scenario data and timing
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

impl Settings {
    /// Defaults merged with config files and `RTDB__*` environment variables.
    pub fn new() -> Result<Self> {
        Self::load(None)
    }

    /// Load configuration from multiple sources with priority:
    /// 1. Hardcoded defaults
    /// 2. Optional `config/default` and `config/local`
    /// 3. `CONFIG_PATH` file
    /// 4. `config_path` (must exist when given)
    /// 5. Environment variables
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);

        config = config
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Ok(path) = env::var("CONFIG_PATH") {
            config = config.add_source(File::with_name(&path));
        }

        if let Some(path) = config_path {
            config = config.add_source(File::with_name(path).required(true));
        }

        // Environment variables (highest priority)
        config = config.add_source(
            Environment::with_prefix("RTDB")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        Ok(config.build()?.try_deserialize()?)
    }

    /// Apply command line values on top of the loaded sources.
    pub fn with_database_overrides(
        mut self,
        url: Option<String>,
        cert: Option<PathBuf>,
    ) -> Self {
        if let Some(url) = url {
            self.database.url = url;
        }
        if let Some(cert) = cert {
            self.database.cert = cert;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;
        self.emulator.validate()?;
        self.scenario.validate()?;
        Ok(())
    }
}
