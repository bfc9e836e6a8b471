//! Store connection settings.

use dissident_core::{DissidentError, KeySpace, Result, DEFAULT_PREFIX};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Connection settings for the grant store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// `host:port` of the Redis server
    #[serde(default = "default_address")]
    pub address: String,

    /// Password for `AUTH`; empty means none
    #[serde(default)]
    pub password: String,

    /// Namespace prefix for every key and channel
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Logical database index
    #[serde(default)]
    pub db: u32,

    /// Deadline for each store command, in milliseconds
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            password: String::new(),
            prefix: default_prefix(),
            db: 0,
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Set the server address
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the password
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the key prefix
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the database index
    #[must_use]
    pub const fn db(mut self, db: u32) -> Self {
        self.db = db;
        self
    }

    /// Per-command deadline
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Key layout under the configured prefix
    #[must_use]
    pub fn key_space(&self) -> KeySpace {
        KeySpace::new(self.prefix.clone())
    }

    /// Check the settings without connecting
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(DissidentError::Config("store prefix must not be empty".into()));
        }
        if self.prefix.ends_with('/') || self.prefix.chars().any(char::is_whitespace) {
            return Err(DissidentError::Config(format!(
                "store prefix {:?} must not end in '/' or contain whitespace",
                self.prefix
            )));
        }
        if self.command_timeout_ms == 0 {
            return Err(DissidentError::Config("command_timeout_ms must be positive".into()));
        }
        self.connection_url().map(|_| ())
    }

    /// `redis://` URL for the configured server, password and database
    pub fn connection_url(&self) -> Result<Url> {
        let (host, port) = self
            .address
            .rsplit_once(':')
            .filter(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
            .ok_or_else(|| {
                DissidentError::Config(format!(
                    "store address {:?} must be host:port",
                    self.address
                ))
            })?;

        let mut url = Url::parse(&format!("redis://{host}:{port}/{}", self.db))
            .map_err(|e| DissidentError::Config(format!("invalid store address: {e}")))?;

        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|()| DissidentError::Config("store password rejected".into()))?;
        }

        Ok(url)
    }
}

// Defaults match a local Redis with the stock namespace.
fn default_address() -> String {
    String::from("localhost:6379")
}

fn default_prefix() -> String {
    String::from(DEFAULT_PREFIX)
}

const fn default_command_timeout_ms() -> u64 {
    2000
}
