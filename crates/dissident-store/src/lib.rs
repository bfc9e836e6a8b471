//! Grant store clients for dissident.
//!
//! The decision engine talks to its key-value store through the
//! [`GrantStore`] trait. Two implementations ship here:
//!
//! - [`RedisStore`]: a multiplexed Redis connection, used in production
//! - `MemoryStore`: an in-process map with a virtual clock, used in tests
//!   (feature `test-util`)

mod config;
#[cfg(any(test, feature = "test-util"))]
mod memory;
mod redis_store;
mod store;

pub use config::StoreConfig;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryStore, Published, StoreCommand};
pub use redis_store::RedisStore;
pub use store::GrantStore;

pub use dissident_core::{DissidentError, KeyTtl, Result};
