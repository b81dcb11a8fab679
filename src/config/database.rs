use std::fs::File;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::client::validate_url;
use crate::ConfigError;
use crate::Result;

/// Remote endpoint and the credential document used to reach it.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Database endpoint, e.g. `https://your-db.firebaseio.com/`
    /// Required, no default
    #[serde(default)]
    pub url: String,

    /// Path to the service-account credential document
    /// Required, no default
    #[serde(default)]
    pub cert: PathBuf,
}

impl DatabaseConfig {
    pub fn database_url(&self) -> &str {
        &self.url
    }

    /// Open the credential document for reading.
    ///
    /// Fails with [`ConfigError::CertificateUnreadable`] when the path does
    /// not resolve to a readable file.
    pub fn certificate_stream(&self) -> Result<File> {
        let unreadable = |source: std::io::Error| ConfigError::CertificateUnreadable {
            path: self.cert.clone(),
            source,
        };

        let metadata = std::fs::metadata(&self.cert).map_err(unreadable)?;
        if !metadata.is_file() {
            return Err(unreadable(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            ))
            .into());
        }
        Ok(File::open(&self.cert).map_err(unreadable)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.url",
                reason: "must be set".into(),
            }
            .into());
        }
        validate_url(&self.url).map_err(|e| ConfigError::InvalidValue {
            field: "database.url",
            reason: e.to_string(),
        })?;

        if self.cert.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.cert",
                reason: "must be set".into(),
            }
            .into());
        }
        Ok(())
    }
}
