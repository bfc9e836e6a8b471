//! Server configuration.

use dissident_core::GrantPrecedence;
use dissident_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Configuration for a dissident DNS gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// UDP/TCP listen address (default: 0.0.0.0:5353).
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Label attached to exported counters (default: `dns://<listen>`).
    #[serde(default)]
    pub server_name: Option<String>,

    /// Upstream resolvers that allowed queries are forwarded to.
    #[serde(default = "default_upstream")]
    pub upstream: Vec<SocketAddr>,

    /// Which grant wins when both a parent suffix and the exact name match.
    #[serde(default)]
    pub precedence: GrantPrecedence,

    /// Grant store connection.
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            server_name: None,
            upstream: default_upstream(),
            precedence: GrantPrecedence::default(),
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check the config before anything is bound or connected.
    pub fn validate(&self) -> crate::Result<()> {
        if self.upstream.is_empty() {
            return Err(crate::SrvError::Config(
                "at least one upstream resolver is required".into(),
            ));
        }
        if self.upstream.contains(&self.listen) {
            return Err(crate::SrvError::Config(format!(
                "upstream {} is the listen address",
                self.listen
            )));
        }
        self.store.validate()?;
        Ok(())
    }

    /// Label for this server instance.
    #[must_use]
    pub fn server_label(&self) -> String {
        self.server_name
            .clone()
            .unwrap_or_else(|| format!("dns://{}", self.listen))
    }
}

// Default value functions for serde.
fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5353))
}

fn default_upstream() -> Vec<SocketAddr> {
    vec![
        SocketAddr::from(([1, 1, 1, 1], 53)),
        SocketAddr::from(([9, 9, 9, 9], 53)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen.port(), 5353);
        assert_eq!(config.upstream.len(), 2);
        assert_eq!(config.precedence, GrantPrecedence::BroadestFirst);
        assert_eq!(config.store.prefix, "dissident");
        assert_eq!(config.server_label(), "dns://0.0.0.0:5353");
        config.validate().unwrap();
    }

    #[test]
    fn test_config_serialization() {
        let config = ServerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.listen, config.listen);
        assert_eq!(parsed.store, config.store);
    }

    #[test]
    fn test_full_toml() {
        let config = ServerConfig::from_toml(
            r#"
            listen = "127.0.0.1:53"
            server_name = "edge-1"
            upstream = ["192.0.2.53:53"]
            precedence = "most-specific-first"

            [store]
            address = "10.0.0.5:6379"
            password = "hunter2"
            prefix = "gate"
            db = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.listen.port(), 53);
        assert_eq!(config.server_label(), "edge-1");
        assert_eq!(config.precedence, GrantPrecedence::MostSpecificFirst);
        assert_eq!(config.store.address, "10.0.0.5:6379");
        assert_eq!(config.store.password, "hunter2");
        assert_eq!(config.store.prefix, "gate");
        assert_eq!(config.store.db, 4);
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_property_rejected() {
        let err = ServerConfig::from_toml("colour = \"red\"").unwrap_err();
        assert!(matches!(err, crate::SrvError::Toml(_)));

        let err = ServerConfig::from_toml("[store]\nhost = \"x\"").unwrap_err();
        assert!(matches!(err, crate::SrvError::Toml(_)));
    }

    #[test]
    fn test_validation() {
        let config = ServerConfig {
            upstream: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.upstream = vec![config.listen];
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.store.prefix = String::new();
        assert!(matches!(config.validate(), Err(crate::SrvError::Store(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = ServerConfig::load(std::path::Path::new("/nonexistent/dissident.toml")).unwrap();
        assert_eq!(config.listen, default_listen());
    }

    #[test]
    fn test_load_file() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "listen = \"127.0.0.1:5300\"\n[store]\ndb = 1\n").unwrap();

        let config = ServerConfig::load(tmpfile.path()).unwrap();
        assert_eq!(config.listen.port(), 5300);
        assert_eq!(config.store.db, 1);
        assert_eq!(config.store.address, "localhost:6379");
    }
}
