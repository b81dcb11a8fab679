//! Harness Error Hierarchy
//!
//! Errors are grouped by the stage at which a scenario can fail:
//! configuration, client initialization, store operations and finally the
//! scenario assertions themselves.

use std::path::PathBuf;
use std::time::Duration;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid endpoint/credential configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Client could not be built from the configured material
    #[error(transparent)]
    ClientInit(#[from] ClientInitError),

    /// Failure delivered through an operation's completion signal
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// Scenario invariant violated
    #[error(transparent)]
    Assertion(#[from] AssertionError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Layered source loading or deserialization failures
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    /// A loaded value failed validation
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// Credential path does not resolve to a readable file
    #[error("Problem reading certificate at {path}")]
    CertificateUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(ConfigError::Source(e))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientInitError {
    /// Credential document is not valid JSON or misses required fields
    #[error("Malformed credentials: {0}")]
    MalformedCredentials(#[from] serde_json::Error),

    /// Credential document parsed but carries unusable values
    #[error("Invalid credentials field `{field}`: {reason}")]
    InvalidCredentials { field: &'static str, reason: String },

    /// Credential stream could not be read
    #[error("Failed to read credentials: {0}")]
    CredentialsIo(#[from] std::io::Error),

    #[error("Client requires credentials before it can be built")]
    MissingCredentials,

    /// Endpoint is not an http(s) URL with a host
    #[error("Unsupported database URL: {0}")]
    UnsupportedUrl(String),

    /// Persisted emulator state exists but cannot be loaded
    #[error("Failed to load emulator state from {path}: {reason}")]
    EmulatorState { path: PathBuf, reason: String },
}

/// Errors carried by completion signals.
///
/// Cloneable so that a completion can be both logged and surfaced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("Invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Transaction kept conflicting with concurrent writes on the same path
    #[error("Transaction at {path} aborted after {attempts} attempts")]
    MaxRetries { path: String, attempts: u32 },

    /// The client was shut down or its worker is gone
    #[error("Client disconnected")]
    Disconnected,

    /// The store cancelled a read
    #[error("Read at {path} cancelled: {reason}")]
    Cancelled { path: String, reason: String },

    /// A completion signal was dropped without firing
    #[error("Completion signal `{0}` dropped before completing")]
    Dropped(&'static str),

    /// Failure reported by a store implementation
    #[error("Store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssertionError {
    #[error("Expected {expected} calls under {path}, found {actual}")]
    CallCount {
        path: String,
        expected: usize,
        actual: usize,
    },

    /// Seeded siblings lost: the defect under study
    #[error("Calls missing under {path}: {missing:?}")]
    MissingCalls { path: String, missing: Vec<String> },

    /// Race attempted on a record that was never (fully) seeded
    #[error("Calls under {path} were not seeded before the race, run reset first (missing {missing:?})")]
    NotSeeded { path: String, missing: Vec<String> },

    #[error("Joined {received} of {expected} completions before all signals were released")]
    JoinIncomplete { expected: usize, received: usize },

    #[error("Joined {received} of {expected} completions within {timeout:?}")]
    JoinTimedOut {
        expected: usize,
        received: usize,
        timeout: Duration,
    },
}

impl Error {
    /// True when the failure is the lost-siblings reproduction rather than a
    /// harness or store problem.
    pub fn is_reproduction(&self) -> bool {
        matches!(self, Error::Assertion(AssertionError::MissingCalls { .. }))
    }
}
