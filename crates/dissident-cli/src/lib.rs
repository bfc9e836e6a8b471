//! # dissident-cli
//!
//! Command-line interface for the dissident DNS access-grant gate.
//!
//! ## Commands
//!
//! - **serve**: run the DNS gate
//! - **check**: validate the configuration and reach the grant store
//! - **inspect**: show, read-only, which client id an address maps to and
//!   which grant keys would authorize a name

pub mod cli;
pub mod logging;

pub use cli::run;
