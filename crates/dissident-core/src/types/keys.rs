use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::ClientId;
use crate::name;

/// Default key namespace prefix
pub const DEFAULT_PREFIX: &str = "dissident";

/// Order in which candidate grant keys are checked. The first hit wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrantPrecedence {
    /// Top-level suffix first, down to the full name, exact key last
    #[default]
    BroadestFirst,
    /// Exact key first, then suffixes from the full name up to the top level
    MostSpecificFirst,
}

/// Store key layout under a namespace prefix.
///
/// - `<prefix>/ip/<address>` holds the client id for an address
/// - `<prefix>/<client>/<suffix-or-name>` holds a grant
/// - `<prefix>/<client>` is the client's request-signal channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl KeySpace {
    /// Create a key space under `prefix`
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The namespace prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key holding the client id bound to `addr`
    #[must_use]
    pub fn identity_key(&self, addr: IpAddr) -> String {
        format!("{}/ip/{addr}", self.prefix)
    }

    /// Key holding a grant for `client` on `target` (a `.suffix` or exact name)
    #[must_use]
    pub fn grant_key(&self, client: &ClientId, target: &str) -> String {
        format!("{}/{client}/{target}", self.prefix)
    }

    /// Pub/sub channel carrying request signals for `client`
    #[must_use]
    pub fn signal_channel(&self, client: &ClientId) -> String {
        format!("{}/{client}", self.prefix)
    }

    /// Every grant key that could authorize `name`, in lookup order.
    ///
    /// `name` must already be normalized. The root name has no candidates.
    #[must_use]
    pub fn candidate_keys(
        &self,
        client: &ClientId,
        name: &str,
        precedence: GrantPrecedence,
    ) -> Vec<String> {
        if name.is_empty() {
            return Vec::new();
        }

        let mut targets = name::suffixes(name);
        match precedence {
            GrantPrecedence::BroadestFirst => targets.push(name.to_string()),
            GrantPrecedence::MostSpecificFirst => {
                targets.reverse();
                targets.insert(0, name.to_string());
            }
        }

        targets
            .iter()
            .map(|target| self.grant_key(client, target))
            .collect()
    }
}
