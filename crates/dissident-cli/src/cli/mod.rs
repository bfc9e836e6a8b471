//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;

use crate::logging;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init_tracing(&cli.log_level, cli.log_json)?;

    // Create context for commands
    let ctx = commands::Context {
        config_path: cli.config,
        store_password: cli.store_password,
        output_format: cli.output,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Serve(args) => commands::serve::execute(ctx, args).await,
        Commands::Check => commands::check::execute(ctx).await,
        Commands::Inspect(args) => commands::inspect::execute(ctx, args).await,
    }
}
