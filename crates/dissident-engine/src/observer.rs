//! Query outcome counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receives one event per query outcome.
pub trait QueryObserver: Send + Sync {
    /// A query reached the gate, whatever its type
    fn request_seen(&self);

    /// An address query was allowed through
    fn allowed(&self);

    /// An address query was answered with NXDOMAIN
    fn blocked(&self);
}

/// Point-in-time copy of [`QueryCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Queries seen
    pub requests: u64,
    /// Queries allowed
    pub allowed: u64,
    /// Queries blocked
    pub blocked: u64,
}

/// Monotonic in-process counters for one server instance.
#[derive(Debug, Default)]
pub struct QueryCounters {
    requests: AtomicU64,
    allowed: AtomicU64,
    blocked: AtomicU64,
}

impl QueryCounters {
    /// Fresh counters at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current values
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
        }
    }
}

impl QueryObserver for QueryCounters {
    fn request_seen(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    fn allowed(&self) {
        self.allowed.fetch_add(1, Ordering::Relaxed);
    }

    fn blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }
}

/// Forwards every event to several observers.
#[derive(Default)]
pub struct FanoutObserver {
    observers: Vec<Arc<dyn QueryObserver>>,
}

impl FanoutObserver {
    /// Empty fan-out
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer
    #[must_use]
    pub fn with(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl QueryObserver for FanoutObserver {
    fn request_seen(&self) {
        self.observers.iter().for_each(|o| o.request_seen());
    }

    fn allowed(&self) {
        self.observers.iter().for_each(|o| o.allowed());
    }

    fn blocked(&self) {
        self.observers.iter().for_each(|o| o.blocked());
    }
}
