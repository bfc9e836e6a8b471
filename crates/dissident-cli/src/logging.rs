//! Tracing subscriber setup.

use anyhow::{Context as _, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TARGETS: [&str; 4] = [
    "dissident_cli",
    "dissident_srv",
    "dissident_engine",
    "dissident_store",
];

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise every dissident crate logs at
/// `level`. With `log_json` each event is one JSON line.
pub fn init_tracing(level: &str, log_json: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(level)?,
    };

    let json = log_json.then(|| fmt::layer().json());
    let text = (!log_json).then(|| fmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()
        .context("tracing subscriber already installed")
}

/// Filter enabling the dissident crates at `level`.
fn level_filter(level: &str) -> Result<EnvFilter> {
    let directives = TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log level {level:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_covers_every_crate() {
        let filter = level_filter("debug").unwrap().to_string();
        for target in TARGETS {
            assert!(filter.contains(&format!("{target}=debug")), "{filter}");
        }
    }

    #[test]
    fn test_level_filter_rejects_unknown_level() {
        assert!(level_filter("loud").is_err());
    }
}
