//! Connection settings for the Data Warehouse client.

use std::fmt;

use crate::error::ApiError;

/// Environment variable holding the service base URL.
pub const URL_ENV: &str = "DATA_WAREHOUSE_URL";

/// Environment variable holding the bearer token.
pub const API_KEY_ENV: &str = "DATA_WAREHOUSE_API_KEY";

/// Base URL and API key for one warehouse deployment.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Read `DATA_WAREHOUSE_URL` and `DATA_WAREHOUSE_API_KEY`.
    ///
    /// A missing variable is reported the same way as an empty one.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let config = Self {
            base_url: lookup(URL_ENV).unwrap_or_default(),
            api_key: lookup(API_KEY_ENV).unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Both fields must be non-empty. This is the only input validation the
    /// client performs.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.base_url.is_empty() {
            return Err(ApiError::InvalidConfiguration("url is empty".to_string()));
        }
        if self.api_key.is_empty() {
            return Err(ApiError::InvalidConfiguration("apiKey is empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
