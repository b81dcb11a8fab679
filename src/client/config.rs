use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;

use crate::EmulatorConfig;

/// Client configuration parameters
///
/// Controls how the emulated round trip to the database behaves. Latency is
/// sampled uniformly per round trip from `[min_latency, max_latency]`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Client id representation, used to tag log lines
    pub id: String,

    /// Lower bound of a single round trip
    /// Default: 0
    pub min_latency: Duration,

    /// Upper bound of a single round trip
    /// Default: 0
    pub max_latency: Duration,

    /// Attempts a transaction gets before failing with `MaxRetries`
    /// Default: 25
    pub max_transaction_retries: u32,

    /// Where the emulated database persists its tree, if anywhere
    /// Default: None
    pub state_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            id: nanoid::nanoid!(8),
            min_latency: Duration::ZERO,
            max_latency: Duration::ZERO,
            max_transaction_retries: 25,
            state_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn sample_latency(&self) -> Duration {
        if self.max_latency <= self.min_latency {
            return self.min_latency;
        }
        rand::thread_rng().gen_range(self.min_latency..=self.max_latency)
    }
}

impl From<&EmulatorConfig> for ClientConfig {
    fn from(emulator: &EmulatorConfig) -> Self {
        Self {
            min_latency: Duration::from_millis(emulator.min_latency_ms),
            max_latency: Duration::from_millis(emulator.max_latency_ms),
            max_transaction_retries: emulator.max_transaction_retries,
            state_dir: emulator.state_dir.clone(),
            ..Default::default()
        }
    }
}
