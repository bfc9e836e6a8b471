//! Command implementations.

pub mod check;
pub mod inspect;
pub mod serve;

use anyhow::{Context as _, Result};
use dissident_srv::ServerConfig;
use std::path::PathBuf;

use crate::cli::args::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Config file location
    pub config_path: PathBuf,

    /// Store password override
    pub store_password: Option<String>,

    /// Output format
    pub output_format: OutputFormat,
}

impl Context {
    /// Load the config file (defaults if absent) and apply overrides.
    pub fn load_config(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::load(&self.config_path)
            .with_context(|| format!("loading {}", self.config_path.display()))?;

        if let Some(password) = &self.store_password {
            config.store.password.clone_from(password);
        }

        Ok(config)
    }
}
