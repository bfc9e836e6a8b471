//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// DNS gate that resolves names only for clients holding an access grant
///
/// Address lookups from clients without a grant for the name (or a parent
/// domain) get NXDOMAIN, and the request is published on the client's
/// signal channel in the grant store.
#[derive(Parser, Debug)]
#[command(name = "dissident")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(
        short,
        long,
        env = "DISSIDENT_CONFIG",
        global = true,
        default_value = "/etc/dissident/dissident.toml"
    )]
    pub config: PathBuf,

    /// Grant store password (overrides the config file)
    #[arg(long, env = "DISSIDENT_STORE_PASSWORD", global = true, hide_env_values = true)]
    pub store_password: Option<String>,

    /// Log level for dissident crates (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Pretty,
    /// JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the DNS gate
    Serve(ServeArgs),

    /// Validate the config and check the grant store is reachable
    Check,

    /// Show the client id and candidate grants for an address (read-only)
    Inspect(InspectArgs),
}

// ============================================================================
// Serve command
// ============================================================================

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (overrides the config file)
    #[arg(short, long)]
    pub listen: Option<SocketAddr>,

    /// Upstream resolver; repeat for several (overrides the config file)
    #[arg(short, long)]
    pub upstream: Vec<SocketAddr>,

    /// OpenTelemetry OTLP endpoint for metrics export
    /// (e.g. `http://localhost:4317`). Requires the `metrics` feature.
    #[cfg(feature = "metrics")]
    #[arg(long, env = "DISSIDENT_METRICS_ENDPOINT")]
    pub metrics_endpoint: Option<String>,
}

// ============================================================================
// Inspect command
// ============================================================================

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Source address to look up
    #[arg(short, long)]
    pub address: IpAddr,

    /// Name whose candidate grant keys should be listed
    #[arg(short, long)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from([
            "dissident",
            "--config",
            "gate.toml",
            "serve",
            "--listen",
            "127.0.0.1:53",
            "-u",
            "192.0.2.1:53",
            "-u",
            "192.0.2.2:53",
        ]);
        assert_eq!(cli.config, PathBuf::from("gate.toml"));
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.listen, Some("127.0.0.1:53".parse().unwrap()));
        assert_eq!(args.upstream.len(), 2);
    }

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::parse_from([
            "dissident",
            "inspect",
            "--address",
            "2001:db8::7",
            "--name",
            "www.example.com",
            "-o",
            "json",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        let Commands::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert!(args.address.is_ipv6());
        assert_eq!(args.name.as_deref(), Some("www.example.com"));
    }
}
