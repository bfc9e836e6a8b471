//! dissident-srv: DNS server that gates address lookups on access grants.
//!
//! A client may resolve a name only while it holds a grant for that name or
//! one of its parent domains. Everything else receives NXDOMAIN, and a
//! request signal is published so that an external actor can decide whether
//! to issue a grant.
//!
//! # Architecture
//!
//! Requests flow through a chain of hickory [`RequestHandler`]s:
//!
//! - [`GrantGate`] - evaluates A/AAAA queries with the decision engine and
//!   either answers NXDOMAIN or hands the request on unchanged
//! - [`Forwarder`] - resolves whatever reaches it against upstream servers
//!
//! # Store layout
//!
//! - `<prefix>/ip/<address>` - rotating client id for a source address
//! - `<prefix>/<client>/<.suffix|name>` - grant, value = window in seconds
//! - `<prefix>/<client>` - pub/sub channel for request signals
//!
//! [`RequestHandler`]: hickory_server::server::RequestHandler

pub mod config;
pub mod error;
pub mod gate;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod server;
pub mod upstream;

// Re-exports for convenience.
pub use config::ServerConfig;
pub use error::SrvError;
pub use gate::GrantGate;
pub use upstream::Forwarder;

/// Result type for dissident-srv operations.
pub type Result<T> = std::result::Result<T, SrvError>;
