//! In-process grant store with a virtual clock.
//!
//! Keys expire against a clock that only moves when [`MemoryStore::advance`]
//! is called, which makes TTL behaviour deterministic in tests. Individual
//! commands can be switched to fail to simulate a store outage.

use async_trait::async_trait;
use dissident_core::{DissidentError, KeyTtl, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::GrantStore;

/// Store commands, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreCommand {
    /// `GET`
    Get,
    /// `MGET`
    Mget,
    /// `SET ... EX`
    SetEx,
    /// `TTL`
    Ttl,
    /// `EXPIRE`
    Expire,
    /// `PUBLISH`
    Publish,
    /// `PING`
    Ping,
}

/// A message sent with [`GrantStore::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Channel name
    pub channel: String,
    /// Message body
    pub payload: String,
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Duration>,
}

#[derive(Debug, Default)]
struct State {
    now: Duration,
    entries: HashMap<String, Entry>,
    published: Vec<Published>,
    failing: HashSet<StoreCommand>,
    calls: HashMap<StoreCommand, usize>,
}

impl State {
    fn live(&mut self, key: &str) -> Option<&mut Entry> {
        let now = self.now;
        let expired = self
            .entries
            .get(key)
            .is_some_and(|e| e.expires_at.is_some_and(|at| at <= now));
        if expired {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    fn begin(&mut self, command: StoreCommand) -> Result<()> {
        *self.calls.entry(command).or_default() += 1;
        if self.failing.contains(&command) {
            return Err(DissidentError::StoreUnavailable(format!(
                "{command:?}: connection refused"
            )));
        }
        Ok(())
    }
}

/// Grant store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store at virtual time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the virtual clock forward
    pub fn advance(&self, by: Duration) {
        self.state().now += by;
    }

    /// Write a key directly, optionally with an expiry
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>, ttl: Option<Duration>) {
        let mut state = self.state();
        let expires_at = ttl.map(|ttl| state.now + ttl);
        state.entries.insert(
            key.into(),
            Entry {
                value: value.into(),
                expires_at,
            },
        );
    }

    /// Current value of a key, if live
    pub fn value(&self, key: &str) -> Option<String> {
        self.state().live(key).map(|e| e.value.clone())
    }

    /// Remaining lifetime of a key
    pub fn remaining(&self, key: &str) -> KeyTtl {
        let mut state = self.state();
        let now = state.now;
        match state.live(key) {
            None => KeyTtl::Missing,
            Some(Entry { expires_at: None, .. }) => KeyTtl::Persistent,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => KeyTtl::Expires(at.saturating_sub(now)),
        }
    }

    /// Messages published so far
    pub fn published(&self) -> Vec<Published> {
        self.state().published.clone()
    }

    /// Make `command` fail (or succeed again)
    pub fn set_failing(&self, command: StoreCommand, failing: bool) {
        let mut state = self.state();
        if failing {
            state.failing.insert(command);
        } else {
            state.failing.remove(&command);
        }
    }

    /// Make every command fail, as if the server were down
    pub fn go_offline(&self) {
        for command in [
            StoreCommand::Get,
            StoreCommand::Mget,
            StoreCommand::SetEx,
            StoreCommand::Ttl,
            StoreCommand::Expire,
            StoreCommand::Publish,
            StoreCommand::Ping,
        ] {
            self.set_failing(command, true);
        }
    }

    /// How many times `command` was issued, failed attempts included
    pub fn calls(&self, command: StoreCommand) -> usize {
        self.state().calls.get(&command).copied().unwrap_or_default()
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut state = self.state();
        state.begin(StoreCommand::Get)?;
        Ok(state.live(key).map(|e| e.value.clone()))
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let mut state = self.state();
        state.begin(StoreCommand::Mget)?;
        Ok(keys
            .iter()
            .map(|key| state.live(key).map(|e| e.value.clone()))
            .collect())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut state = self.state();
        state.begin(StoreCommand::SetEx)?;
        let expires_at = Some(state.now + ttl);
        state.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        self.state().begin(StoreCommand::Ttl)?;
        Ok(self.remaining(key))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut state = self.state();
        state.begin(StoreCommand::Expire)?;
        let expires_at = state.now + ttl;
        Ok(state.live(key).map(|e| e.expires_at = Some(expires_at)).is_some())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<u64> {
        let mut state = self.state();
        state.begin(StoreCommand::Publish)?;
        state.published.push(Published {
            channel: channel.to_string(),
            payload: payload.to_string(),
        });
        Ok(0)
    }

    async fn ping(&self) -> Result<()> {
        self.state().begin(StoreCommand::Ping)
    }
}
