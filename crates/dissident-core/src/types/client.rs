use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::{DissidentError, Result};

/// How long an address keeps its client id without any queries.
pub const ROTATION_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Anonymized identifier assigned to a source address.
///
/// Generated ids are the final group of a random version-4 UUID: twelve
/// lowercase hex characters, unrelated to the address they are bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Length of generated identifiers
    pub const GENERATED_LEN: usize = 12;

    /// Generate a fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4().hyphenated().to_string();
        let tail = uuid.rsplit('-').next().unwrap_or(&uuid);
        Self(tail.to_string())
    }

    /// Accept an identifier read back from the store.
    ///
    /// Ids become part of key paths, so empty values, `/` and whitespace are
    /// rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() || raw.contains('/') || raw.chars().any(char::is_whitespace) {
            return Err(DissidentError::InvalidClientId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// The identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ClientId {
    type Error = DissidentError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}
