use std::fmt;
use std::io::Read;

use serde::Deserialize;

use crate::ClientInitError;

const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Service-account credential document.
///
/// Only the shape is checked; the key material is never used to sign
/// anything by the emulator.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    #[serde(rename = "type")]
    pub account_type: String,

    pub project_id: String,

    pub private_key_id: String,

    pub private_key: String,

    pub client_email: String,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".into()
}

impl ServiceAccountCredentials {
    /// Parse and validate a credential document from a byte stream.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, ClientInitError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        let credentials: Self = serde_json::from_str(&raw)?;
        credentials.validate()?;
        Ok(credentials)
    }

    pub fn validate(&self) -> Result<(), ClientInitError> {
        if self.account_type != SERVICE_ACCOUNT_TYPE {
            return Err(ClientInitError::InvalidCredentials {
                field: "type",
                reason: format!(
                    "expected `{}`, got `{}`",
                    SERVICE_ACCOUNT_TYPE, self.account_type
                ),
            });
        }
        if self.project_id.trim().is_empty() {
            return Err(ClientInitError::InvalidCredentials {
                field: "project_id",
                reason: "must not be empty".into(),
            });
        }
        if !self.client_email.contains('@') {
            return Err(ClientInitError::InvalidCredentials {
                field: "client_email",
                reason: format!("`{}` is not an email address", self.client_email),
            });
        }
        if !self.private_key.contains("-----BEGIN") {
            return Err(ClientInitError::InvalidCredentials {
                field: "private_key",
                reason: "expected a PEM encoded key".into(),
            });
        }
        Ok(())
    }
}

// Keeps the key out of logs.
impl fmt::Debug for ServiceAccountCredentials {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .finish_non_exhaustive()
    }
}
