//! Core types for the dissident DNS access-grant gate.
//!
//! This crate holds everything that does not touch the network:
//!
//! - **Types**: client identifiers, the store key namespace, grant durations
//! - **Names**: query-name normalization and candidate grant keys
//! - **Refresh**: the anti-forensic grant refresh computation
//! - **Errors**: the shared [`DissidentError`] taxonomy
//!
//! # Example
//!
//! ```rust
//! use dissident_core::{ClientId, GrantPrecedence, KeySpace};
//!
//! let keys = KeySpace::new("dissident");
//! let client = ClientId::parse("4f1c2a9be07d").unwrap();
//! let candidates =
//!     keys.candidate_keys(&client, "www.example.com", GrantPrecedence::BroadestFirst);
//!
//! assert_eq!(
//!     candidates,
//!     [
//!         "dissident/4f1c2a9be07d/.com",
//!         "dissident/4f1c2a9be07d/.example.com",
//!         "dissident/4f1c2a9be07d/.www.example.com",
//!         "dissident/4f1c2a9be07d/www.example.com",
//!     ]
//! );
//! ```

mod error;
pub mod name;
pub mod refresh;
pub mod types;

pub use error::{DissidentError, Result};
pub use refresh::RefreshPlan;
pub use types::*;
