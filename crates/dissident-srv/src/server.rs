//! DNS server runner: connects the store, binds UDP+TCP and serves the gate.

use dissident_engine::{AccessEngine, QueryObserver};
use dissident_store::{GrantStore, RedisStore};
use hickory_server::server::ServerFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tracing::info;

use crate::config::ServerConfig;
use crate::gate::GrantGate;
use crate::upstream::Forwarder;

/// TCP connection timeout for DNS queries.
const TCP_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the handler chain (gate in front of the forwarder) over `store`.
pub fn build_handler(
    config: &ServerConfig,
    store: Arc<dyn GrantStore>,
    observer: Arc<dyn QueryObserver>,
) -> GrantGate<Forwarder> {
    let engine = AccessEngine::builder(store)
        .key_space(config.store.key_space())
        .precedence(config.precedence)
        .observer(observer)
        .build();

    GrantGate::new(engine, Forwarder::new(&config.upstream))
}

/// Start the DNS gate with the given configuration.
///
/// Fails before binding anything if the config is invalid or the grant
/// store does not answer. Runs until the server stops.
pub async fn run(config: &ServerConfig, observer: Arc<dyn QueryObserver>) -> crate::Result<()> {
    config.validate()?;

    let store = RedisStore::connect(&config.store).await?;
    let handler = build_handler(config, Arc::new(store), observer);

    let mut server = ServerFuture::new(handler);

    // Bind UDP.
    let udp_socket = UdpSocket::bind(config.listen)
        .await
        .map_err(|e| crate::SrvError::Server(format!("UDP bind {}: {e}", config.listen)))?;
    info!(addr = %config.listen, "UDP socket bound");
    server.register_socket(udp_socket);

    // Bind TCP.
    let tcp_listener = TcpListener::bind(config.listen)
        .await
        .map_err(|e| crate::SrvError::Server(format!("TCP bind {}: {e}", config.listen)))?;
    info!(addr = %config.listen, "TCP listener bound");
    server.register_listener(tcp_listener, TCP_TIMEOUT);

    info!(
        addr = %config.listen,
        server = %config.server_label(),
        upstream = ?config.upstream,
        precedence = ?config.precedence,
        "dissident DNS gate running"
    );

    // Run until shutdown.
    server
        .block_until_done()
        .await
        .map_err(|e| crate::SrvError::Server(format!("server error: {e}")))?;

    Ok(())
}
