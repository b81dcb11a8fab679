use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::ConfigError;
use crate::Result;

/// Timing of the in-process database.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmulatorConfig {
    /// Lower bound of a round trip (unit: milliseconds)
    /// Default: 0
    #[serde(default)]
    pub min_latency_ms: u64,

    /// Upper bound of a round trip (unit: milliseconds)
    /// Default: 0
    #[serde(default)]
    pub max_latency_ms: u64,

    /// Transaction attempts before the completion carries `MaxRetries`
    /// Default: 25
    #[serde(default = "default_max_transaction_retries")]
    pub max_transaction_retries: u32,

    /// Directory holding one state file per database URL. Unset keeps the
    /// database in memory for the lifetime of the process.
    /// Default: None
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            min_latency_ms: 0,
            max_latency_ms: 0,
            max_transaction_retries: default_max_transaction_retries(),
            state_dir: None,
        }
    }
}

impl EmulatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_latency_ms > self.max_latency_ms {
            return Err(ConfigError::InvalidValue {
                field: "emulator.min_latency_ms",
                reason: format!(
                    "{} exceeds max_latency_ms {}",
                    self.min_latency_ms, self.max_latency_ms
                ),
            }
            .into());
        }
        if self.max_transaction_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "emulator.max_transaction_retries",
                reason: "must allow at least one attempt".into(),
            }
            .into());
        }
        Ok(())
    }
}

fn default_max_transaction_retries() -> u32 {
    25
}
