//! Client module
//!
//! Turns configured endpoint and credential material into a connected
//! [`Database`]:
//! - [`ClientBuilder`] - validates the URL and credentials, then connects
//! - [`Client`] - owns the connection and hands out the database handle
//! - [`ServiceAccountCredentials`] - parsed credential document
//!
//! # Basic Usage
//! ```no_run
//! use rtdb_race::{Client, Settings};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let settings = Settings::new().unwrap();
//!     let client = Client::connect(&settings).await.unwrap();
//!
//!     let database = client.database();
//!     // ... run scenarios against `database`
//!
//!     client.shutdown();
//! }
//! ```

mod builder;
mod config;
mod credentials;

pub use builder::*;
pub use self::config::*;
pub use credentials::*;


use std::sync::Arc;

use tracing::info;

use crate::Database;
use crate::EmulatorClient;
use crate::Result;
use crate::Settings;

/// Connected database client, torn down with [`shutdown()`](Client::shutdown)
///
/// Created through [`builder()`](Client::builder) or
/// [`connect()`](Client::connect).
#[derive(Clone)]
pub struct Client {
    url: String,
    credentials: Arc<ServiceAccountCredentials>,
    config: ClientConfig,
    database: Arc<EmulatorClient>,
}

impl Client {
    pub(super) fn new(
        url: String,
        credentials: ServiceAccountCredentials,
        config: ClientConfig,
        database: EmulatorClient,
    ) -> Self {
        Self {
            url,
            credentials: Arc::new(credentials),
            config,
            database: Arc::new(database),
        }
    }

    /// Create a configured client builder for `url`
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    /// Build a client from loaded settings: read the credential file, then
    /// connect to the configured URL.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let credentials =
            ServiceAccountCredentials::from_reader(settings.database.certificate_stream()?)?;
        Client::builder(settings.database.database_url())
            .credentials(credentials)
            .set_config(ClientConfig::from(&settings.emulator))
            .build()
            .await
    }

    /// Handle for issuing operations
    pub fn database(&self) -> Arc<dyn Database> {
        self.database.clone()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn project_id(&self) -> &str {
        &self.credentials.project_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.database.is_connected()
    }

    /// Release the connection; operations still in flight complete with
    /// [`crate::OperationError::Disconnected`].
    pub fn shutdown(&self) {
        info!("[Client-{}] shutdown {}", self.config.id, self.url);
        self.database.shutdown();
    }
}
