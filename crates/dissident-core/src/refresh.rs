//! Anti-forensic grant refresh.
//!
//! Every allowed query resets a grant's expiry to its nominal window, so the
//! visible countdown never reveals when the grant was issued. A burst of
//! queries shortly after issuance (more than ten minutes in, but within the
//! first tenth of the window) silently doubles the window instead, hiding
//! the size of the issued grant. Windows of 32 days or more stop growing.

use std::time::Duration;

use crate::NominalDuration;

/// Minimum elapsed time, in seconds, before a window may be extended.
pub const EXTEND_MIN_ELAPSED_SECS: u64 = 600;

/// Windows at or above this many seconds (32 days) are never extended.
pub const EXTEND_CEILING_SECS: u64 = 2_764_800;

/// Extension only happens within the first `1 / EXTEND_WINDOW_DIVISOR` of a window.
pub const EXTEND_WINDOW_DIVISOR: u64 = 10;

/// What to write back for a matched grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPlan {
    /// Store `nominal` as the new value and expire after `nominal`
    Extend {
        /// Doubled window
        nominal: NominalDuration,
    },
    /// Keep the value, expire after `nominal`
    Slide {
        /// Unchanged window
        nominal: NominalDuration,
    },
}

impl RefreshPlan {
    /// Decide how to refresh a grant with window `nominal` and `remaining` TTL.
    #[must_use]
    pub fn compute(nominal: NominalDuration, remaining: Duration) -> Self {
        let window = nominal.as_secs();
        let elapsed = window.saturating_sub(remaining.as_secs());

        let early = elapsed.saturating_mul(EXTEND_WINDOW_DIVISOR) <= window;
        let settled = elapsed > EXTEND_MIN_ELAPSED_SECS;
        let below_ceiling = window < EXTEND_CEILING_SECS;

        if early && settled && below_ceiling {
            Self::Extend {
                nominal: nominal.doubled(),
            }
        } else {
            Self::Slide { nominal }
        }
    }

    /// Window to write (and expire after)
    #[must_use]
    pub const fn nominal(&self) -> NominalDuration {
        match self {
            Self::Extend { nominal } | Self::Slide { nominal } => *nominal,
        }
    }

    /// Returns true if the stored value changes
    #[must_use]
    pub const fn is_extension(&self) -> bool {
        matches!(self, Self::Extend { .. })
    }
}
