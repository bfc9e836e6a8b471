//! Source address to client id mapping.

use dissident_core::{ClientId, KeySpace, Result, ROTATION_WINDOW};
use dissident_store::GrantStore;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Assigns each source address a random client id that rotates after a
/// week without queries.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn GrantStore>,
    keys: KeySpace,
}

impl IdentityResolver {
    /// Create a resolver over `store`
    pub fn new(store: Arc<dyn GrantStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Client id for `addr`, creating one if needed.
    ///
    /// Never fails: store errors are logged and a freshly generated id is
    /// used so the query can still be decided.
    pub async fn resolve(&self, addr: IpAddr) -> ClientId {
        let key = self.keys.identity_key(addr);

        let existing = match self.store.get(&key).await {
            Ok(Some(raw)) => match ClientId::parse(&raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(error = %e, "replacing unusable client id");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "client id lookup failed, issuing a fresh id");
                None
            }
        };

        match existing {
            Some(id) => {
                if let Err(e) = self.store.expire(&key, ROTATION_WINDOW).await {
                    error!(client = %id, error = %e, "failed to extend client id rotation window");
                }
                id
            }
            None => {
                let id = ClientId::generate();
                debug!(client = %id, "issued client id");
                if let Err(e) = self.store.set_ex(&key, id.as_str(), ROTATION_WINDOW).await {
                    error!(client = %id, error = %e, "failed to store client id");
                }
                id
            }
        }
    }

    /// Client id currently bound to `addr`, without creating or touching it
    pub async fn peek(&self, addr: IpAddr) -> Result<Option<ClientId>> {
        let key = self.keys.identity_key(addr);
        self.store
            .get(&key)
            .await?
            .map(|raw| ClientId::parse(&raw))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dissident_core::KeyTtl;
    use dissident_store::{MemoryStore, StoreCommand};
    use std::time::Duration;

    fn setup() -> (Arc<MemoryStore>, IdentityResolver) {
        let store = Arc::new(MemoryStore::new());
        let resolver = IdentityResolver::new(store.clone(), KeySpace::new("t"));
        (store, resolver)
    }

    fn addr() -> IpAddr {
        "198.51.100.20".parse().unwrap()
    }

    #[tokio::test]
    async fn test_same_address_same_id() {
        let (_, resolver) = setup();
        let first = resolver.resolve(addr()).await;
        let second = resolver.resolve(addr()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_distinct_addresses_distinct_ids() {
        let (_, resolver) = setup();
        let a = resolver.resolve(addr()).await;
        let b = resolver.resolve("198.51.100.21".parse().unwrap()).await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_activity_slides_rotation_window() {
        let (store, resolver) = setup();
        let id = resolver.resolve(addr()).await;

        store.advance(Duration::from_secs(6 * 24 * 3600));
        assert_eq!(resolver.resolve(addr()).await, id);
        assert_eq!(
            store.remaining("t/ip/198.51.100.20"),
            KeyTtl::Expires(ROTATION_WINDOW)
        );

        store.advance(Duration::from_secs(6 * 24 * 3600));
        assert_eq!(resolver.resolve(addr()).await, id);
    }

    #[tokio::test]
    async fn test_inactivity_rotates_id() {
        let (store, resolver) = setup();
        let id = resolver.resolve(addr()).await;
        store.advance(ROTATION_WINDOW);
        assert_ne!(resolver.resolve(addr()).await, id);
    }

    #[tokio::test]
    async fn test_store_outage_fails_open() {
        let (store, resolver) = setup();
        store.go_offline();
        let id = resolver.resolve(addr()).await;
        assert_eq!(id.as_str().len(), ClientId::GENERATED_LEN);
        assert_eq!(store.calls(StoreCommand::SetEx), 1);
    }

    #[tokio::test]
    async fn test_unusable_stored_id_is_replaced() {
        let (store, resolver) = setup();
        store.insert("t/ip/198.51.100.20", "", None);
        let id = resolver.resolve(addr()).await;
        assert_eq!(store.value("t/ip/198.51.100.20").as_deref(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn test_peek_does_not_create() {
        let (store, resolver) = setup();
        assert_eq!(resolver.peek(addr()).await.unwrap(), None);
        assert_eq!(store.calls(StoreCommand::SetEx), 0);

        let id = resolver.resolve(addr()).await;
        assert_eq!(resolver.peek(addr()).await.unwrap(), Some(id));
    }
}
