//! `check` - validate the config and make sure the grant store answers.

use anyhow::Result;
use dissident_store::RedisStore;
use serde_json::json;

use super::Context;
use crate::cli::args::OutputFormat;

/// Execute the check command.
pub async fn execute(ctx: Context) -> Result<()> {
    let config = ctx.load_config()?;
    config.validate()?;

    // connect() pings before returning
    RedisStore::connect(&config.store).await?;

    match ctx.output_format {
        OutputFormat::Json => {
            let summary = json!({
                "config": ctx.config_path.display().to_string(),
                "listen": config.listen.to_string(),
                "server": config.server_label(),
                "upstream": config.upstream.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "precedence": config.precedence,
                "store": {
                    "address": config.store.address,
                    "db": config.store.db,
                    "prefix": config.store.prefix,
                    "reachable": true,
                },
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Pretty => {
            println!("config      {}", ctx.config_path.display());
            println!("listen      {}", config.listen);
            println!("server      {}", config.server_label());
            for upstream in &config.upstream {
                println!("upstream    {upstream}");
            }
            println!("precedence  {:?}", config.precedence);
            println!(
                "store       {} db {} prefix {:?} (ok)",
                config.store.address, config.store.db, config.store.prefix
            );
        }
    }

    Ok(())
}
