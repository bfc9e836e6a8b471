//! dissident - DNS access-grant gate
//!
//! Serves DNS, resolving names only for clients that hold a grant.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dissident_cli::run().await
}
