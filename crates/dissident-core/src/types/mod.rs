mod client;
mod duration;
mod keys;

pub use client::*;
pub use duration::*;
pub use keys::*;
