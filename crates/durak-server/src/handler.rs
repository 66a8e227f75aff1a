//! Per-connection handler: identify-first protocol and message routing.
//!
//! Each accepted connection gets its own task running this handler. The
//! flow is:
//!   1. WebSocket upgrade
//!   2. First message must be `authenticate` (with a deadline) — the
//!      provider verifies the assertion and yields an [`Identity`]
//!   3. Loop: decode [`ClientMessage`]s and route them to the lobby
//!
//! Outbound traffic never touches this task: a dedicated writer task
//! drains the connection's unbounded channel into the WebSocket sink, so
//! lobby code can push messages without awaiting network I/O.
//!
//! Failures are soft wherever the protocol allows: a message that fails
//! to decode, an unknown room, a full room all answer `error` and leave
//! the connection open. Only transport failures and a failed or missing
//! identification end the session.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use durak_lobby::OutboundSender;
use durak_protocol::{
    ClientMessage, Codec, ConnectionId, PlayerInfo, ServerMessage,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::ServerError;
use crate::identity::{Identity, IdentityProvider};
use crate::server::ServerState;

type WsSource = SplitStream<WebSocketStream<TcpStream>>;
type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

const RATE_WINDOW: Duration = Duration::from_secs(1);
const RATE_LIMIT: u32 = 10;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<P: IdentityProvider>(
    stream: TcpStream,
    conn_id: ConnectionId,
    state: Arc<ServerState<P>>,
) -> Result<(), ServerError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (sink, mut source) = ws.split();

    let (tx, rx) = mpsc::unbounded_channel::<ServerMessage>();
    let writer = tokio::spawn(write_outbound(sink, rx, state.codec));

    let result = run_session(&mut source, conn_id, &tx, &state).await;

    // Cleanup runs whether the session ended cleanly or not. The
    // disconnect is routed through the lobby only for connections that
    // actually identified.
    let identity = state.registry.lock().await.unbind(conn_id);
    state.lobby.unregister_client(conn_id).await;
    if let Some(identity) = identity {
        state.lobby.handle_disconnection(&identity.player_id).await;
    }

    // All sender clones are gone now, so the writer drains and exits.
    drop(tx);
    let _ = writer.await;
    result
}

/// The writer half: drains the outbound channel into the sink until
/// every sender is dropped or the peer goes away.
async fn write_outbound(
    mut sink: WsSink,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    codec: impl Codec,
) {
    while let Some(message) = rx.recv().await {
        let bytes = match codec.encode(&message) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%error, "dropping unencodable message");
                continue;
            }
        };
        if sink.send(Message::Binary(bytes.into())).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
}

async fn run_session<P: IdentityProvider>(
    source: &mut WsSource,
    conn_id: ConnectionId,
    tx: &OutboundSender,
    state: &ServerState<P>,
) -> Result<(), ServerError> {
    let Some(identity) = identify(source, conn_id, tx, state).await? else {
        return Ok(());
    };
    let player_id = identity.player_id.clone();
    tracing::info!(%conn_id, %player_id, "connection identified");

    let mut limiter = RateLimiter::new();
    loop {
        let Some(data) = next_payload(source).await? else {
            tracing::debug!(%conn_id, %player_id, "connection closed");
            return Ok(());
        };

        if !limiter.allow() {
            send_error(tx, "rate limit exceeded");
            continue;
        }

        let message: ClientMessage = match state.codec.decode(&data) {
            Ok(message) => message,
            Err(error) => {
                tracing::debug!(%player_id, %error, "undecodable message");
                send_error(tx, format!("invalid message: {error}"));
                continue;
            }
        };

        dispatch(state, &identity, tx, message).await;
    }
}

/// The identify phase. Returns `None` when the connection should close
/// without entering the session loop: the peer went away, missed the
/// deadline, sent something other than `authenticate`, or failed
/// verification.
async fn identify<P: IdentityProvider>(
    source: &mut WsSource,
    conn_id: ConnectionId,
    tx: &OutboundSender,
    state: &ServerState<P>,
) -> Result<Option<Identity>, ServerError> {
    let payload =
        match tokio::time::timeout(state.identify_timeout, next_payload(source))
            .await
        {
            Ok(payload) => payload?,
            Err(_) => {
                tracing::debug!(%conn_id, "identification timed out");
                send_error(tx, "authentication timed out");
                return Ok(None);
            }
        };
    let Some(data) = payload else {
        return Ok(None);
    };

    let message: ClientMessage = match state.codec.decode(&data) {
        Ok(message) => message,
        Err(error) => {
            send_error(tx, format!("invalid message: {error}"));
            return Ok(None);
        }
    };
    let ClientMessage::Authenticate { assertion } = message else {
        send_error(tx, "first message must be authenticate");
        return Ok(None);
    };

    let identity = match state.identity.verify(&assertion).await {
        Ok(identity) => identity,
        Err(error) => {
            tracing::debug!(%conn_id, %error, "identification rejected");
            send_error(tx, error.to_string());
            return Ok(None);
        }
    };

    state.registry.lock().await.bind(conn_id, identity.clone());

    // Acknowledge before registering for broadcasts, so `authenticated`
    // is always the first message a client receives.
    let _ = tx.send(ServerMessage::Authenticated {
        player: PlayerInfo {
            id: identity.player_id.clone(),
            name: identity.display_name.clone(),
            ready: false,
            connected: true,
            hand_count: 0,
        },
    });
    state.lobby.register_client(conn_id, tx.clone()).await;
    // Fresh clients get the current listing right away.
    state.lobby.send_rooms_list(tx).await;

    Ok(Some(identity))
}

/// Routes one decoded message to the lobby. Rejections answer `error`;
/// nothing here closes the connection.
async fn dispatch<P: IdentityProvider>(
    state: &ServerState<P>,
    identity: &Identity,
    tx: &OutboundSender,
    message: ClientMessage,
) {
    let player_id = &identity.player_id;
    match message {
        ClientMessage::Authenticate { .. } => {
            send_error(tx, "already authenticated");
        }

        ClientMessage::CreateRoom { name, rules } => {
            let result = state
                .lobby
                .create_room(
                    name,
                    rules,
                    player_id.clone(),
                    identity.display_name.clone(),
                    tx.clone(),
                )
                .await;
            if let Err(error) = result {
                send_error(tx, error.to_string());
            }
        }

        ClientMessage::JoinRoom { room_id } => {
            let result = state
                .lobby
                .join_room(
                    room_id,
                    player_id.clone(),
                    identity.display_name.clone(),
                    tx.clone(),
                )
                .await;
            if let Err(error) = result {
                send_error(tx, error.to_string());
            }
        }

        ClientMessage::LeaveRoom => {
            state.lobby.leave_room(player_id).await;
        }

        ClientMessage::SetReady => {
            state.lobby.set_ready(player_id).await;
        }

        ClientMessage::Heartbeat => {
            state.lobby.handle_heartbeat(player_id).await;
            let _ = tx.send(ServerMessage::HeartbeatResponse {
                timestamp: unix_ms(),
            });
        }

        ClientMessage::GetRooms => {
            state.lobby.send_rooms_list(tx).await;
        }

        ClientMessage::GetStats => {
            let stats = state.lobby.stats().await;
            let _ = tx.send(ServerMessage::ServerStats { stats });
        }
    }
}

/// Reads frames until a payload-bearing one arrives. `Ok(None)` means
/// the peer closed; ping/pong frames are skipped.
async fn next_payload(source: &mut WsSource) -> Result<Option<Vec<u8>>, ServerError> {
    while let Some(frame) = source.next().await {
        match frame? {
            Message::Binary(data) => return Ok(Some(data.into())),
            Message::Text(text) => return Ok(Some(text.as_bytes().to_vec())),
            Message::Close(_) => return Ok(None),
            _ => continue,
        }
    }
    Ok(None)
}

fn send_error(tx: &OutboundSender, message: impl Into<String>) {
    let _ = tx.send(ServerMessage::Error { message: message.into() });
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Fixed-window inbound rate limiter, one per connection. A client that
/// exceeds the budget gets `error` replies until the window rolls over;
/// the connection itself stays up.
struct RateLimiter {
    window_start: Instant,
    count: u32,
}

impl RateLimiter {
    fn new() -> Self {
        Self { window_start: Instant::now(), count: 0 }
    }

    fn allow(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.window_start) >= RATE_WINDOW {
            self.window_start = now;
            self.count = 0;
        }
        self.count += 1;
        self.count <= RATE_LIMIT
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_allows_up_to_the_budget() {
        let mut limiter = RateLimiter::new();
        for _ in 0..RATE_LIMIT {
            assert!(limiter.allow());
        }
        assert!(!limiter.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_resets_when_the_window_rolls() {
        let mut limiter = RateLimiter::new();
        for _ in 0..=RATE_LIMIT {
            limiter.allow();
        }
        assert!(!limiter.allow());

        tokio::time::advance(RATE_WINDOW).await;
        assert!(limiter.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_window_is_fixed_not_sliding() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.allow());

        // Partway through the window the original budget still applies.
        tokio::time::advance(RATE_WINDOW / 2).await;
        for _ in 1..RATE_LIMIT {
            assert!(limiter.allow());
        }
        assert!(!limiter.allow());

        // The window is anchored at its start, so it rolls half a window
        // later.
        tokio::time::advance(RATE_WINDOW / 2).await;
        assert!(limiter.allow());
    }
}
