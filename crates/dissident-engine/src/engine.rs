//! Per-query decision orchestration.

use dissident_core::name::normalize_name;
use dissident_core::{ClientId, GrantPrecedence, KeySpace, RefreshPlan};
use dissident_store::GrantStore;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::{GrantLookup, GrantMatch, GrantRefresher, IdentityResolver, QueryCounters, QueryObserver};

/// Why a query was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// No grant exists for the name or any parent suffix
    NoGrant,
    /// A store or decoding failure forced a fail-closed denial
    Failed(String),
}

/// Outcome of [`AccessEngine::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Resolution may continue
    Allow {
        /// Querying client
        client: ClientId,
        /// Grant that authorized the query
        grant: GrantMatch,
        /// How the grant was refreshed
        plan: RefreshPlan,
    },
    /// Resolution is refused and a request signal was published
    Deny {
        /// Querying client
        client: ClientId,
        /// Why
        reason: DenyReason,
    },
}

impl Verdict {
    /// Returns true for [`Verdict::Allow`]
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// The client the verdict applies to
    #[must_use]
    pub const fn client(&self) -> &ClientId {
        match self {
            Self::Allow { client, .. } | Self::Deny { client, .. } => client,
        }
    }
}

/// Decides whether a source address may resolve a name.
///
/// Holds no per-query state; one instance serves all concurrent queries.
#[derive(Clone)]
pub struct AccessEngine {
    identity: IdentityResolver,
    lookup: GrantLookup,
    refresher: GrantRefresher,
    store: Arc<dyn GrantStore>,
    keys: KeySpace,
    observer: Arc<dyn QueryObserver>,
}

impl AccessEngine {
    /// Create a builder over `store`
    pub fn builder(store: Arc<dyn GrantStore>) -> AccessEngineBuilder {
        AccessEngineBuilder::new(store)
    }

    /// Count a query reaching the gate
    pub fn record_request(&self) {
        self.observer.request_seen();
    }

    /// Decide an address query for `name` from `source`.
    ///
    /// Allowed queries have their grant refreshed. Denied queries publish
    /// the normalized name on the client's signal channel exactly once.
    pub async fn evaluate(&self, source: IpAddr, name: &str) -> Verdict {
        let name = normalize_name(name);
        let client = self.identity.resolve(source).await;

        let outcome = match self.lookup.find_grant(&client, &name).await {
            Ok(Some(grant)) => match self.refresher.refresh(&grant).await {
                Ok(plan) => Ok((grant, plan)),
                Err(e) => {
                    error!(client = %client, key = %grant.key, error = %e, "grant refresh failed, denying");
                    Err(DenyReason::Failed(e.to_string()))
                }
            },
            Ok(None) => Err(DenyReason::NoGrant),
            Err(e) => {
                error!(client = %client, name = %name, error = %e, "grant lookup failed, denying");
                Err(DenyReason::Failed(e.to_string()))
            }
        };

        match outcome {
            Ok((grant, plan)) => {
                self.observer.allowed();
                debug!(client = %client, name = %name, key = %grant.key, "allowed");
                Verdict::Allow {
                    client,
                    grant,
                    plan,
                }
            }
            Err(reason) => {
                self.signal(&client, &name).await;
                self.observer.blocked();
                debug!(client = %client, name = %name, reason = ?reason, "blocked");
                Verdict::Deny { client, reason }
            }
        }
    }

    /// Identity resolver, for read-only inspection
    pub const fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    /// Grant lookup, for read-only inspection
    pub const fn lookup(&self) -> &GrantLookup {
        &self.lookup
    }

    /// Key layout in use
    pub const fn keys(&self) -> &KeySpace {
        &self.keys
    }

    async fn signal(&self, client: &ClientId, name: &str) {
        let channel = self.keys.signal_channel(client);
        match self.store.publish(&channel, name).await {
            Ok(receivers) => debug!(client = %client, receivers, "request signal published"),
            Err(e) => warn!(client = %client, error = %e, "failed to publish request signal"),
        }
    }
}

/// Builder for configuring an [`AccessEngine`]
pub struct AccessEngineBuilder {
    store: Arc<dyn GrantStore>,
    keys: KeySpace,
    precedence: GrantPrecedence,
    observer: Arc<dyn QueryObserver>,
}

impl AccessEngineBuilder {
    /// Create a builder with the default namespace and precedence
    pub fn new(store: Arc<dyn GrantStore>) -> Self {
        Self {
            store,
            keys: KeySpace::default(),
            precedence: GrantPrecedence::default(),
            observer: Arc::new(QueryCounters::new()),
        }
    }

    /// Set the key layout
    #[must_use]
    pub fn key_space(mut self, keys: KeySpace) -> Self {
        self.keys = keys;
        self
    }

    /// Set the grant precedence
    #[must_use]
    pub const fn precedence(mut self, precedence: GrantPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Set the outcome observer
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Build the engine
    #[must_use]
    pub fn build(self) -> AccessEngine {
        AccessEngine {
            identity: IdentityResolver::new(self.store.clone(), self.keys.clone()),
            lookup: GrantLookup::new(self.store.clone(), self.keys.clone(), self.precedence),
            refresher: GrantRefresher::new(self.store.clone()),
            store: self.store,
            keys: self.keys,
            observer: self.observer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dissident_core::KeyTtl;
    use dissident_store::{MemoryStore, Published, StoreCommand};
    use std::time::Duration;

    struct Harness {
        store: Arc<MemoryStore>,
        counters: Arc<QueryCounters>,
        engine: AccessEngine,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let counters = Arc::new(QueryCounters::new());
        let engine = AccessEngine::builder(store.clone())
            .key_space(KeySpace::new("t"))
            .observer(counters.clone())
            .build();
        Harness {
            store,
            counters,
            engine,
        }
    }

    fn source() -> IpAddr {
        "203.0.113.9".parse().unwrap()
    }

    #[tokio::test]
    async fn test_no_grant_denies_and_signals_once() {
        let h = harness();
        let verdict = h.engine.evaluate(source(), "sub.blocked.example.").await;

        let Verdict::Deny { client, reason } = verdict else {
            panic!("expected deny");
        };
        assert_eq!(reason, DenyReason::NoGrant);
        assert_eq!(
            h.store.published(),
            vec![Published {
                channel: format!("t/{client}"),
                payload: "sub.blocked.example".to_string(),
            }]
        );
        assert_eq!(h.counters.snapshot().blocked, 1);
        assert_eq!(h.counters.snapshot().allowed, 0);
    }

    #[tokio::test]
    async fn test_parent_grant_allows_and_refreshes() {
        let h = harness();
        let client = h.engine.identity().resolve(source()).await;
        let key = format!("t/{client}/.example.com");
        h.store.insert(&key, "1000", Some(Duration::from_secs(1000)));
        h.store.advance(Duration::from_secs(300));

        let verdict = h.engine.evaluate(source(), "WWW.Example.com.").await;
        assert!(verdict.is_allowed());
        assert_eq!(verdict.client(), &client);
        assert_eq!(h.store.remaining(&key), KeyTtl::Expires(Duration::from_secs(1000)));
        assert!(h.store.published().is_empty());
        assert_eq!(h.counters.snapshot().allowed, 1);
    }

    #[tokio::test]
    async fn test_lookup_outage_denies_with_single_publish_attempt() {
        let h = harness();
        h.store.set_failing(StoreCommand::Mget, true);

        let verdict = h.engine.evaluate(source(), "example.com").await;
        assert!(matches!(
            verdict,
            Verdict::Deny {
                reason: DenyReason::Failed(_),
                ..
            }
        ));
        assert_eq!(h.store.calls(StoreCommand::Publish), 1);
        assert_eq!(h.counters.snapshot().blocked, 1);
    }

    #[tokio::test]
    async fn test_full_outage_still_decides() {
        let h = harness();
        h.store.go_offline();

        let verdict = h.engine.evaluate(source(), "example.com").await;
        assert!(!verdict.is_allowed());
        assert_eq!(h.store.calls(StoreCommand::Publish), 1);
        assert_eq!(h.counters.snapshot().blocked, 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_denies() {
        let h = harness();
        let client = h.engine.identity().resolve(source()).await;
        h.store
            .insert(format!("t/{client}/.example.com"), "1000", Some(Duration::from_secs(1000)));
        h.store.set_failing(StoreCommand::Ttl, true);

        let verdict = h.engine.evaluate(source(), "example.com").await;
        assert!(!verdict.is_allowed());
        assert_eq!(h.store.published().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_grant_denies() {
        let h = harness();
        let client = h.engine.identity().resolve(source()).await;
        h.store.insert(format!("t/{client}/example.com"), "1d", None);

        let verdict = h.engine.evaluate(source(), "example.com").await;
        assert!(matches!(
            verdict,
            Verdict::Deny {
                reason: DenyReason::Failed(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_burst_after_issuance_doubles_grant() {
        let h = harness();
        let client = h.engine.identity().resolve(source()).await;
        let key = format!("t/{client}/.example.net");
        h.store.insert(&key, "100000", Some(Duration::from_secs(100_000)));
        h.store.advance(Duration::from_secs(8_000));

        let verdict = h.engine.evaluate(source(), "cdn.example.net").await;
        let Verdict::Allow { plan, .. } = verdict else {
            panic!("expected allow");
        };
        assert!(plan.is_extension());
        assert_eq!(h.store.value(&key).as_deref(), Some("200000"));
    }

    #[tokio::test]
    async fn test_request_counter_is_separate() {
        let h = harness();
        h.engine.record_request();
        assert_eq!(h.counters.snapshot().requests, 1);
        assert_eq!(h.counters.snapshot().blocked, 0);
    }
}
