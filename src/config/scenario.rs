use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::ConfigError;
use crate::DbPath;
use crate::Result;

/// Fixed data and timing knobs of the reproduction scenarios.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScenarioConfig {
    /// Path of the user record all scenarios work under
    /// Default: "/test/users/u1"
    #[serde(default = "default_user_path")]
    pub user_path: String,

    /// Default: "test user"
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Number of calls seeded by reset, named `c1..cN`
    /// Default: 10
    #[serde(default = "default_seed_calls")]
    pub seed_calls: usize,

    /// Default: "9999999"
    #[serde(default = "default_phone_number")]
    pub phone_number: String,

    /// Pause between submitting the call transactions and the user
    /// transaction (unit: milliseconds). A long pause lets the call
    /// transactions settle first and hides the race.
    /// Default: 0
    #[serde(default)]
    pub pause_before_user_update_ms: u64,

    /// Deadline for joining completions (unit: milliseconds), 0 waits forever
    /// Default: 0
    #[serde(default)]
    pub join_timeout_ms: u64,

    /// Races run by the probe scenario
    /// Default: 10
    #[serde(default = "default_probe_iterations")]
    pub probe_iterations: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            user_path: default_user_path(),
            user_name: default_user_name(),
            seed_calls: default_seed_calls(),
            phone_number: default_phone_number(),
            pause_before_user_update_ms: 0,
            join_timeout_ms: 0,
            probe_iterations: default_probe_iterations(),
        }
    }
}

impl ScenarioConfig {
    pub fn user_path(&self) -> Result<DbPath> {
        Ok(DbPath::parse(&self.user_path)?)
    }

    /// Ids of the seeded calls, in creation order.
    pub fn seed_call_ids(&self) -> Vec<String> {
        (1..=self.seed_calls).map(|i| format!("c{}", i)).collect()
    }

    pub fn pause_before_user_update(&self) -> Duration {
        Duration::from_millis(self.pause_before_user_update_ms)
    }

    pub fn join_timeout(&self) -> Option<Duration> {
        (self.join_timeout_ms > 0).then(|| Duration::from_millis(self.join_timeout_ms))
    }

    pub fn validate(&self) -> Result<()> {
        let path = DbPath::parse(&self.user_path).map_err(|e| ConfigError::InvalidValue {
            field: "scenario.user_path",
            reason: e.to_string(),
        })?;
        if path.is_root() {
            return Err(ConfigError::InvalidValue {
                field: "scenario.user_path",
                reason: "must not be the database root".into(),
            }
            .into());
        }
        if self.seed_calls == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scenario.seed_calls",
                reason: "must seed at least one call".into(),
            }
            .into());
        }
        if self.phone_number.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scenario.phone_number",
                reason: "must not be empty".into(),
            }
            .into());
        }
        Ok(())
    }
}

fn default_user_path() -> String {
    "/test/users/u1".into()
}
fn default_user_name() -> String {
    "test user".into()
}
fn default_seed_calls() -> usize {
    10
}
fn default_phone_number() -> String {
    "9999999".into()
}
fn default_probe_iterations() -> usize {
    10
}
