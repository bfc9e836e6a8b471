//! Applies [`RefreshPlan`] to a matched grant.

use dissident_core::{DissidentError, KeyTtl, RefreshPlan, Result};
use dissident_store::GrantStore;
use std::sync::Arc;
use tracing::debug;

use crate::GrantMatch;

/// Rewrites a matched grant's expiry (and possibly its window).
///
/// The TTL read and the write are two separate commands. Two queries racing
/// on the same grant may both extend it; the result is still a valid window.
#[derive(Clone)]
pub struct GrantRefresher {
    store: Arc<dyn GrantStore>,
}

impl GrantRefresher {
    /// Create a refresher over `store`
    pub fn new(store: Arc<dyn GrantStore>) -> Self {
        Self { store }
    }

    /// Refresh `grant`, returning the plan that was written.
    pub async fn refresh(&self, grant: &GrantMatch) -> Result<RefreshPlan> {
        let remaining = match self.store.ttl(&grant.key).await? {
            KeyTtl::Expires(remaining) => remaining,
            // No expiry yet: treat as freshly issued so the slide attaches one.
            KeyTtl::Persistent => grant.nominal.as_duration(),
            KeyTtl::Missing => {
                return Err(DissidentError::GrantVanished {
                    key: grant.key.clone(),
                })
            }
        };

        let plan = RefreshPlan::compute(grant.nominal, remaining);
        let window = plan.nominal();

        match plan {
            RefreshPlan::Extend { .. } => {
                self.store
                    .set_ex(&grant.key, &window.encode(), window.as_duration())
                    .await?;
            }
            RefreshPlan::Slide { .. } => {
                if !self.store.expire(&grant.key, window.as_duration()).await? {
                    return Err(DissidentError::GrantVanished {
                        key: grant.key.clone(),
                    });
                }
            }
        }

        debug!(
            key = %grant.key,
            remaining = remaining.as_secs(),
            window = window.as_secs(),
            extended = plan.is_extension(),
            "grant refreshed"
        );
        Ok(plan)
    }
}
