//! Hierarchical grant lookup.

use dissident_core::{ClientId, GrantPrecedence, KeySpace, KeyTtl, NominalDuration, Result};
use dissident_store::GrantStore;
use std::sync::Arc;
use tracing::debug;

/// A grant key that authorizes the queried name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantMatch {
    /// Store key that matched
    pub key: String,
    /// Nominal window stored at that key
    pub nominal: NominalDuration,
}

/// One candidate key as seen by [`GrantLookup::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateState {
    /// Store key
    pub key: String,
    /// Raw stored value
    pub value: Option<String>,
    /// Remaining lifetime
    pub ttl: KeyTtl,
}

/// Finds the grant covering a name: the name itself or any parent suffix.
#[derive(Clone)]
pub struct GrantLookup {
    store: Arc<dyn GrantStore>,
    keys: KeySpace,
    precedence: GrantPrecedence,
}

impl GrantLookup {
    /// Create a lookup over `store`
    pub fn new(store: Arc<dyn GrantStore>, keys: KeySpace, precedence: GrantPrecedence) -> Self {
        Self {
            store,
            keys,
            precedence,
        }
    }

    /// First grant covering `name` in precedence order.
    ///
    /// All candidates are read in a single batch. A matched value that is
    /// not integer seconds is an error, not a miss.
    pub async fn find_grant(&self, client: &ClientId, name: &str) -> Result<Option<GrantMatch>> {
        let candidates = self.keys.candidate_keys(client, name, self.precedence);
        if candidates.is_empty() {
            return Ok(None);
        }

        let values = self.store.mget(&candidates).await?;

        for (key, value) in candidates.into_iter().zip(values) {
            if let Some(raw) = value {
                let nominal = NominalDuration::decode(&key, &raw)?;
                debug!(client = %client, key = %key, nominal = %nominal, "grant matched");
                return Ok(Some(GrantMatch { key, nominal }));
            }
        }

        Ok(None)
    }

    /// Every candidate for `name` with its stored value and TTL. Read-only.
    pub async fn inspect(&self, client: &ClientId, name: &str) -> Result<Vec<CandidateState>> {
        let candidates = self.keys.candidate_keys(client, name, self.precedence);
        let values = self.store.mget(&candidates).await?;

        let mut states = Vec::with_capacity(candidates.len());
        for (key, value) in candidates.into_iter().zip(values) {
            let ttl = if value.is_some() {
                self.store.ttl(&key).await?
            } else {
                KeyTtl::Missing
            };
            states.push(CandidateState { key, value, ttl });
        }
        Ok(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dissident_core::DissidentError;
    use dissident_store::{MemoryStore, StoreCommand};
    use std::time::Duration;

    fn client() -> ClientId {
        ClientId::parse("0000feedbeef").unwrap()
    }

    fn setup(precedence: GrantPrecedence) -> (Arc<MemoryStore>, GrantLookup) {
        let store = Arc::new(MemoryStore::new());
        let lookup = GrantLookup::new(store.clone(), KeySpace::new("t"), precedence);
        (store, lookup)
    }

    #[tokio::test]
    async fn test_parent_grant_covers_descendants() {
        let (store, lookup) = setup(GrantPrecedence::BroadestFirst);
        store.insert("t/0000feedbeef/.example.com", "3600", Some(Duration::from_secs(3600)));

        for name in ["example.com", "www.example.com", "a.b.example.com"] {
            let found = lookup.find_grant(&client(), name).await.unwrap().unwrap();
            assert_eq!(found.key, "t/0000feedbeef/.example.com");
            assert_eq!(found.nominal.as_secs(), 3600);
        }
        assert!(lookup.find_grant(&client(), "example.org").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exact_grant_does_not_cover_children() {
        let (store, lookup) = setup(GrantPrecedence::BroadestFirst);
        store.insert("t/0000feedbeef/www.example.com", "60", None);

        assert!(lookup.find_grant(&client(), "www.example.com").await.unwrap().is_some());
        assert!(lookup.find_grant(&client(), "a.www.example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_grants_are_per_client() {
        let (store, lookup) = setup(GrantPrecedence::BroadestFirst);
        store.insert("t/someoneelse0/.example.com", "3600", None);
        assert!(lookup.find_grant(&client(), "example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_broadest_grant_wins_by_default() {
        let (store, lookup) = setup(GrantPrecedence::BroadestFirst);
        store.insert("t/0000feedbeef/.com", "100", None);
        store.insert("t/0000feedbeef/www.example.com", "200", None);

        let found = lookup.find_grant(&client(), "www.example.com").await.unwrap().unwrap();
        assert_eq!(found.key, "t/0000feedbeef/.com");
        assert_eq!(found.nominal.as_secs(), 100);
    }

    #[tokio::test]
    async fn test_most_specific_grant_wins_when_configured() {
        let (store, lookup) = setup(GrantPrecedence::MostSpecificFirst);
        store.insert("t/0000feedbeef/.com", "100", None);
        store.insert("t/0000feedbeef/.example.com", "150", None);
        store.insert("t/0000feedbeef/www.example.com", "200", None);

        let found = lookup.find_grant(&client(), "www.example.com").await.unwrap().unwrap();
        assert_eq!(found.key, "t/0000feedbeef/www.example.com");

        let found = lookup.find_grant(&client(), "api.example.com").await.unwrap().unwrap();
        assert_eq!(found.key, "t/0000feedbeef/.example.com");
    }

    #[tokio::test]
    async fn test_single_batch_read() {
        let (store, lookup) = setup(GrantPrecedence::BroadestFirst);
        lookup.find_grant(&client(), "a.b.c.d.example").await.unwrap();
        assert_eq!(store.calls(StoreCommand::Mget), 1);
        assert_eq!(store.calls(StoreCommand::Get), 0);
    }

    #[tokio::test]
    async fn test_malformed_value_is_an_error() {
        let (store, lookup) = setup(GrantPrecedence::BroadestFirst);
        store.insert("t/0000feedbeef/.example.com", "forever", None);

        let err = lookup.find_grant(&client(), "example.com").await.unwrap_err();
        assert!(matches!(err, DissidentError::MalformedGrantValue { .. }));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let (store, lookup) = setup(GrantPrecedence::BroadestFirst);
        store.set_failing(StoreCommand::Mget, true);
        let err = lookup.find_grant(&client(), "example.com").await.unwrap_err();
        assert!(err.is_store_error());
    }

    #[tokio::test]
    async fn test_root_name_never_matches() {
        let (store, lookup) = setup(GrantPrecedence::BroadestFirst);
        assert!(lookup.find_grant(&client(), "").await.unwrap().is_none());
        assert_eq!(store.calls(StoreCommand::Mget), 0);
    }

    #[tokio::test]
    async fn test_inspect_reports_every_candidate() {
        let (store, lookup) = setup(GrantPrecedence::BroadestFirst);
        store.insert("t/0000feedbeef/.example.com", "3600", Some(Duration::from_secs(1200)));

        let states = lookup.inspect(&client(), "www.example.com").await.unwrap();
        let keys: Vec<_> = states.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "t/0000feedbeef/.com",
                "t/0000feedbeef/.example.com",
                "t/0000feedbeef/.www.example.com",
                "t/0000feedbeef/www.example.com",
            ]
        );
        assert_eq!(states[1].value.as_deref(), Some("3600"));
        assert_eq!(states[1].ttl, KeyTtl::Expires(Duration::from_secs(1200)));
        assert_eq!(states[0].ttl, KeyTtl::Missing);
    }
}
