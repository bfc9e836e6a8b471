use thiserror::Error;

/// Result type alias for dissident operations
pub type Result<T> = std::result::Result<T, DissidentError>;

/// Errors that can occur while evaluating access grants
#[derive(Error, Debug)]
pub enum DissidentError {
    /// The grant store could not be reached or a command failed
    #[error("grant store unavailable: {0}")]
    StoreUnavailable(String),

    /// A grant key holds a value that is not a positive integer of seconds
    #[error("malformed grant value {value:?} at {key}")]
    MalformedGrantValue {
        /// Key that was read
        key: String,
        /// Raw value found in the store
        value: String,
    },

    /// A grant key matched but expired before its TTL could be read
    #[error("grant vanished before refresh: {key}")]
    GrantVanished {
        /// Key that disappeared
        key: String,
    },

    /// A stored client identifier is unusable
    #[error("invalid client id: {0:?}")]
    InvalidClientId(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl DissidentError {
    /// Returns true if the error came from the store itself
    #[must_use]
    pub const fn is_store_error(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Returns true if a query hitting this error must be denied
    #[must_use]
    pub const fn fails_closed(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::MalformedGrantValue { .. } | Self::GrantVanished { .. }
        )
    }
}
