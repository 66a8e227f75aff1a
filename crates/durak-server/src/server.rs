//! `GameServer` builder and accept loop.
//!
//! Ties the layers together: TCP accept → WebSocket upgrade → identify →
//! lobby. One handler task per connection; all shared state lives in
//! [`ServerState`] behind an `Arc`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use durak_lobby::{Lobby, LobbyConfig};
use durak_protocol::{ConnectionId, JsonCodec};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::ServerError;
use crate::handler::handle_connection;
use crate::identity::IdentityProvider;
use crate::registry::ConnectionRegistry;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<P: IdentityProvider> {
    pub(crate) lobby: Lobby,
    pub(crate) registry: Mutex<ConnectionRegistry>,
    pub(crate) identity: P,
    pub(crate) codec: JsonCodec,
    /// How long a fresh connection gets to send `authenticate`.
    pub(crate) identify_timeout: Duration,
}

/// Builder for configuring and starting a [`GameServer`].
pub struct GameServerBuilder {
    bind_addr: String,
    lobby_config: LobbyConfig,
    identify_timeout: Duration,
}

impl GameServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            lobby_config: LobbyConfig::default(),
            identify_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the lobby timing configuration.
    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.lobby_config = config;
        self
    }

    /// Overrides how long a connection may stay unidentified.
    pub fn identify_timeout(mut self, timeout: Duration) -> Self {
        self.identify_timeout = timeout;
        self
    }

    /// Binds the listener and assembles the server with the given
    /// identity provider.
    pub async fn build<P: IdentityProvider>(
        self,
        identity: P,
    ) -> Result<GameServer<P>, ServerError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "server listening");

        let state = Arc::new(ServerState {
            lobby: Lobby::new(self.lobby_config),
            registry: Mutex::new(ConnectionRegistry::new()),
            identity,
            codec: JsonCodec,
            identify_timeout: self.identify_timeout,
        });

        Ok(GameServer { listener, state })
    }
}

impl Default for GameServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Durak session server. Call [`run()`](Self::run) to start
/// accepting connections.
pub struct GameServer<P: IdentityProvider> {
    listener: TcpListener,
    state: Arc<ServerState<P>>,
}

impl<P: IdentityProvider> GameServer<P> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop: one handler task per connection, until the
    /// process is terminated.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("durak server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let conn_id = ConnectionId(
                        NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
                    );
                    tracing::debug!(%conn_id, %addr, "accepted connection");

                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, conn_id, state).await
                        {
                            tracing::debug!(
                                %conn_id,
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
