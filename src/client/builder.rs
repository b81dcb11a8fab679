use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use super::Client;
use super::ClientConfig;
use super::ServiceAccountCredentials;
use crate::ClientInitError;
use crate::EmulatorClient;
use crate::EmulatorServer;
use crate::Result;

pub struct ClientBuilder {
    config: ClientConfig,
    url: String,
    credentials: Option<ServiceAccountCredentials>,
}

impl ClientBuilder {
    /// Create a new builder with default config for the given database URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::default(),
            url: url.into(),
            credentials: None,
        }
    }

    /// Credentials presented when connecting (required)
    pub fn credentials(
        mut self,
        credentials: ServiceAccountCredentials,
    ) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the round-trip latency range (default: no latency)
    pub fn latency(
        mut self,
        min: Duration,
        max: Duration,
    ) -> Self {
        self.config.min_latency = min;
        self.config.max_latency = max;
        self
    }

    /// Set transaction attempts before giving up (default: 25)
    pub fn max_transaction_retries(
        mut self,
        retries: u32,
    ) -> Self {
        self.config.max_transaction_retries = retries;
        self
    }

    /// Persist the database under `dir` (default: in memory only)
    pub fn state_dir(
        mut self,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.config.state_dir = Some(dir.into());
        self
    }

    /// Completely replaces the default configuration
    ///
    /// This discards anything set through [`latency`](ClientBuilder::latency)
    /// or [`max_transaction_retries`](ClientBuilder::max_transaction_retries).
    pub fn set_config(
        mut self,
        config: ClientConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Validate the endpoint and credentials, then connect.
    pub async fn build(self) -> Result<Client> {
        validate_url(&self.url)?;
        let credentials = self.credentials.ok_or(ClientInitError::MissingCredentials)?;
        credentials.validate()?;

        let server = match &self.config.state_dir {
            Some(dir) => EmulatorServer::open(&self.url, dir)?,
            None => EmulatorServer::connect(&self.url),
        };
        info!(
            "[Client-{}] initialized for project {} at {}",
            self.config.id,
            credentials.project_id,
            server.url()
        );
        let database = EmulatorClient::start(server, self.config.clone());

        Ok(Client::new(self.url, credentials, self.config, database))
    }
}

pub(crate) fn validate_url(url: &str) -> std::result::Result<(), ClientInitError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| ClientInitError::UnsupportedUrl(url.to_string()))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(ClientInitError::UnsupportedUrl(url.to_string()));
    }
    Ok(())
}
