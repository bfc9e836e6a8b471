//! Redis-backed grant store.

use async_trait::async_trait;
use dissident_core::{DissidentError, KeyTtl, Result};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use crate::{GrantStore, StoreConfig};

/// Grant store backed by a Redis server.
///
/// Cloning is cheap; clones share one multiplexed connection that
/// reconnects on its own after failures.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    /// Connect and verify the server answers `PING`.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let url = config.connection_url()?;
        let timeout = config.command_timeout();

        let client = redis::Client::open(url.as_str()).map_err(unavailable)?;
        let conn = tokio::time::timeout(timeout, client.get_connection_manager())
            .await
            .map_err(|_| elapsed("CONNECT", timeout))?
            .map_err(unavailable)?;

        let store = Self { conn, timeout };
        store.ping().await?;

        info!(address = %config.address, db = config.db, "connected to grant store");
        Ok(store)
    }

    /// Run one command under the configured deadline
    async fn bounded<T, F>(&self, command: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>> + Send,
    {
        debug!(command, "store command");
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| elapsed(command, self.timeout))?
            .map_err(unavailable)
    }
}

#[async_trait]
impl GrantStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        self.bounded("GET", async move { conn.get(key).await }).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let batch = keys.to_vec();
        let values: Vec<Option<String>> =
            self.bounded("MGET", async move { conn.mget(batch).await }).await?;

        if values.len() != keys.len() {
            return Err(DissidentError::StoreUnavailable(format!(
                "MGET returned {} values for {} keys",
                values.len(),
                keys.len()
            )));
        }
        Ok(values)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded("SET", async move { conn.set_ex(key, value, ttl.as_secs()).await })
            .await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let mut conn = self.conn.clone();
        let secs: i64 = self.bounded("TTL", async move { conn.ttl(key).await }).await?;
        Ok(KeyTtl::from_reply(secs))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let mut conn = self.conn.clone();
        self.bounded("EXPIRE", async move { conn.expire(key, secs).await })
            .await
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        self.bounded("PUBLISH", async move { conn.publish(channel, payload).await })
            .await
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let pong: String = self
            .bounded("PING", async move { redis::cmd("PING").query_async(&mut conn).await })
            .await?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(DissidentError::StoreUnavailable(format!(
                "unexpected PING reply: {pong}"
            )))
        }
    }
}

fn unavailable(err: redis::RedisError) -> DissidentError {
    DissidentError::StoreUnavailable(err.to_string())
}

fn elapsed(command: &str, timeout: Duration) -> DissidentError {
    DissidentError::StoreUnavailable(format!("{command} timed out after {timeout:?}"))
}
