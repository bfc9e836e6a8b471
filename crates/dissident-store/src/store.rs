//! The store abstraction consumed by the decision engine.

use async_trait::async_trait;
use dissident_core::{KeyTtl, Result};
use std::time::Duration;

/// Networked key-value store holding identities and grants.
///
/// Every method maps to a single store command. Failures surface as
/// [`dissident_core::DissidentError::StoreUnavailable`]; callers decide
/// whether that fails open or closed.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Read one key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Read many keys in one round trip. The reply is in `keys` order.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Write a key that expires after `ttl`
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remaining lifetime of a key
    async fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Reset a key's expiry. Returns false if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Publish `payload` on `channel`, returning the number of receivers
    async fn publish(&self, channel: &str, payload: &str) -> Result<u64>;

    /// Round-trip check
    async fn ping(&self) -> Result<()>;
}
