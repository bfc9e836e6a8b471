//! Error types for the dissident DNS server.

use dissident_core::DissidentError;
use thiserror::Error;

/// Errors that can occur while starting or running the server.
#[derive(Error, Debug)]
pub enum SrvError {
    /// DNS server failed to bind or start.
    #[error("dns server error: {0}")]
    Server(String),

    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(String),

    /// The grant store could not be reached or rejected a command.
    #[error(transparent)]
    Store(#[from] DissidentError),

    /// Config file is not valid TOML for [`crate::ServerConfig`].
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
