use std::fmt;
use std::time::Duration;

use crate::{DissidentError, Result};

/// Nominal length of a grant window, in whole seconds.
///
/// Stored in grant keys as decimal text (`"3600"`). The store's own key
/// expiry tracks how much of the window is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NominalDuration(u64);

impl NominalDuration {
    /// Create from seconds. Zero is not a valid grant window.
    pub fn from_secs(secs: u64) -> Option<Self> {
        (secs > 0).then_some(Self(secs))
    }

    /// Decode a stored grant value
    pub fn decode(key: &str, raw: &str) -> Result<Self> {
        let malformed = || DissidentError::MalformedGrantValue {
            key: key.to_string(),
            value: raw.to_string(),
        };

        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        raw.parse::<u64>()
            .ok()
            .and_then(Self::from_secs)
            .ok_or_else(malformed)
    }

    /// Encode for storage
    #[must_use]
    pub fn encode(self) -> String {
        self.0.to_string()
    }

    /// Window length in seconds
    #[must_use]
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Window length as a [`Duration`]
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }

    /// Twice the window
    #[must_use]
    pub const fn doubled(self) -> Self {
        Self(self.0.saturating_mul(2))
    }
}

impl fmt::Display for NominalDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Remaining lifetime of a store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist
    Missing,
    /// The key exists without an expiry
    Persistent,
    /// The key expires after this long
    Expires(Duration),
}

impl KeyTtl {
    /// Interpret a Redis-style `TTL` reply (`-2` missing, `-1` no expiry)
    #[must_use]
    pub fn from_reply(secs: i64) -> Self {
        match u64::try_from(secs) {
            Ok(secs) => Self::Expires(Duration::from_secs(secs)),
            Err(_) if secs == -1 => Self::Persistent,
            Err(_) => Self::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integer_seconds() {
        let d = NominalDuration::decode("k", "3600").unwrap();
        assert_eq!(d.as_secs(), 3600);
        assert_eq!(d.encode(), "3600");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for raw in ["", "1h", "-5", "1.5", " 10", "0", "99999999999999999999999"] {
            let err = NominalDuration::decode("p/c/.com", raw).unwrap_err();
            assert!(
                matches!(err, DissidentError::MalformedGrantValue { .. }),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_doubled() {
        let d = NominalDuration::from_secs(1000).unwrap();
        assert_eq!(d.doubled().as_secs(), 2000);
        assert_eq!(d.doubled().as_duration(), Duration::from_secs(2000));
    }

    #[test]
    fn test_ttl_reply_mapping() {
        assert_eq!(KeyTtl::from_reply(-2), KeyTtl::Missing);
        assert_eq!(KeyTtl::from_reply(-1), KeyTtl::Persistent);
        assert_eq!(KeyTtl::from_reply(0), KeyTtl::Expires(Duration::ZERO));
        assert_eq!(KeyTtl::from_reply(42), KeyTtl::Expires(Duration::from_secs(42)));
    }
}
