//! `inspect` - read-only view of an address's client id and its grants.
//!
//! Nothing is written: the identity is not created or renewed and grants are
//! not refreshed.

use anyhow::Result;
use chrono::{Local, TimeDelta};
use dissident_core::{name::normalize_name, KeyTtl};
use dissident_engine::{AccessEngine, CandidateState};
use dissident_store::RedisStore;
use serde_json::{json, Value};
use std::sync::Arc;

use super::Context;
use crate::cli::args::{InspectArgs, OutputFormat};

/// Execute the inspect command.
pub async fn execute(ctx: Context, args: InspectArgs) -> Result<()> {
    let config = ctx.load_config()?;
    config.validate()?;

    let store = RedisStore::connect(&config.store).await?;
    let engine = AccessEngine::builder(Arc::new(store))
        .key_space(config.store.key_space())
        .precedence(config.precedence)
        .build();

    let address = args.address.to_canonical();
    let client = engine.identity().peek(address).await?;
    let name = args.name.as_deref().map(normalize_name);

    let candidates = match (&client, &name) {
        (Some(client), Some(name)) => engine.lookup().inspect(client, name).await?,
        _ => Vec::new(),
    };

    // The first stored candidate is the one a query would use.
    let matched = candidates.iter().position(|c| c.value.is_some());

    match ctx.output_format {
        OutputFormat::Json => {
            let report = json!({
                "address": address.to_string(),
                "identity_key": engine.keys().identity_key(address),
                "client": client.as_ref().map(ToString::to_string),
                "name": name,
                "candidates": candidates
                    .iter()
                    .enumerate()
                    .map(|(i, c)| candidate_json(c, matched == Some(i)))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Pretty => {
            println!("address  {address}");
            match &client {
                Some(client) => println!("client   {client}"),
                None => {
                    println!("client   (none assigned)");
                    return Ok(());
                }
            }
            if name.is_none() {
                return Ok(());
            }
            if candidates.is_empty() {
                println!("no candidate keys");
            }
            for (i, candidate) in candidates.iter().enumerate() {
                println!(
                    "{} {:<8} {}  {}",
                    if matched == Some(i) { '*' } else { ' ' },
                    candidate.value.as_deref().unwrap_or("-"),
                    candidate.key,
                    describe_ttl(candidate.ttl)
                );
            }
        }
    }

    Ok(())
}

fn candidate_json(candidate: &CandidateState, matched: bool) -> Value {
    let (ttl, expires_at) = match candidate.ttl {
        KeyTtl::Expires(remaining) => (
            Some(remaining.as_secs()),
            expiry(remaining.as_secs()).map(|at| at.to_rfc3339()),
        ),
        KeyTtl::Persistent | KeyTtl::Missing => (None, None),
    };
    json!({
        "key": candidate.key,
        "value": candidate.value,
        "ttl_secs": ttl,
        "expires_at": expires_at,
        "persistent": candidate.ttl == KeyTtl::Persistent,
        "matched": matched,
    })
}

fn describe_ttl(ttl: KeyTtl) -> String {
    match ttl {
        KeyTtl::Missing => "absent".to_string(),
        KeyTtl::Persistent => "no expiry".to_string(),
        KeyTtl::Expires(remaining) => {
            let secs = remaining.as_secs();
            expiry(secs).map_or_else(
                || format!("{secs}s left"),
                |at| format!("{secs}s left (until {})", at.format("%Y-%m-%d %H:%M:%S")),
            )
        }
    }
}

fn expiry(secs: u64) -> Option<chrono::DateTime<Local>> {
    let delta = TimeDelta::try_seconds(i64::try_from(secs).ok()?)?;
    Local::now().checked_add_signed(delta)
}
