//! Access-grant decision engine.
//!
//! For every address query the engine:
//!
//! 1. maps the source address to an anonymized, rotating client id
//!    ([`IdentityResolver`]),
//! 2. looks for a grant on the queried name or any parent suffix
//!    ([`GrantLookup`]),
//! 3. refreshes the matched grant so its expiry leaks nothing about when it
//!    was issued ([`GrantRefresher`]),
//! 4. otherwise publishes a request signal and denies ([`AccessEngine`]).
//!
//! Store failures fail closed everywhere except identity resolution, which
//! falls back to a fresh id rather than dropping the query.

mod engine;
mod identity;
mod lookup;
mod observer;
mod refresh;

pub use engine::{AccessEngine, AccessEngineBuilder, DenyReason, Verdict};
pub use identity::IdentityResolver;
pub use lookup::{CandidateState, GrantLookup, GrantMatch};
pub use observer::{CounterSnapshot, FanoutObserver, QueryCounters, QueryObserver};
pub use refresh::GrantRefresher;

pub use dissident_core::{ClientId, DissidentError, GrantPrecedence, KeySpace, Result};
