use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use ogre_core::net::messages::{
    ClientMessage, JoinAcceptedMsg, JoinMsg, JoinRejectedMsg, ServerMessage,
};
use ogre_core::net::protocol::{
    MAX_MESSAGE_SIZE, PROTOCOL_VERSION, decode_client_message, decode_message_type,
    encode_server_message,
};
use ogre_core::player::{Player, PlayerId, sanitize_display_name};

use crate::error::ServerError;
use crate::session::SessionCommand;
use crate::state::{AppState, ConnectionGuard, PlayerSlot};

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if state.session_tx.is_closed() {
        return ServerError::SessionClosed.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let _guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // The first message must be a Join.
    let first_msg = match ws_receiver.next().await {
        Some(Ok(Message::Binary(data))) => data,
        _ => return,
    };
    let join = match decode_client_message(&first_msg) {
        Ok(ClientMessage::Join(join)) => join,
        Ok(other) => {
            tracing::debug!(msg_type = ?other.message_type(), "First message was not a Join");
            return;
        },
        Err(e) => {
            tracing::debug!(error = %e, "Undecodable handshake");
            return;
        },
    };

    let (player, _slot) = match admit(&join, &state) {
        Ok(admitted) => admitted,
        Err(reason) => {
            tracing::info!(reason = %reason, "Join rejected");
            send_direct(
                &mut ws_sender,
                &ServerMessage::JoinRejected(JoinRejectedMsg { reason }),
            )
            .await;
            return;
        },
    };
    let player_id = player.id;

    // Subscribe before announcing the player so the joiner sees its own
    // PlayerList broadcast.
    let broadcast_rx = state.broadcast_tx.subscribe();

    let accepted = ServerMessage::JoinAccepted(JoinAcceptedMsg {
        player_id,
        tick_rate_hz: state.config.tick_rate_hz,
    });
    if !send_direct(&mut ws_sender, &accepted).await {
        return;
    }

    if state
        .session_tx
        .send(SessionCommand::PlayerJoined { player })
        .is_err()
    {
        tracing::error!(player_id, "{}", ServerError::SessionClosed);
        return;
    }
    tracing::info!(player_id, "Player connected");

    let writer = spawn_writer(ws_sender, broadcast_rx, player_id);

    read_loop(&mut ws_receiver, &state, player_id).await;

    // Player disconnected: clean up
    let _ = state
        .session_tx
        .send(SessionCommand::PlayerLeft { player_id });
    writer.abort();

    tracing::info!(player_id, "Player disconnected");
}

/// Validate a Join and claim an arena slot for it.
fn admit(join: &JoinMsg, state: &AppState) -> Result<(Player, PlayerSlot), String> {
    if join.protocol_version != PROTOCOL_VERSION {
        return Err(format!(
            "Protocol version mismatch: client={}, server={}",
            join.protocol_version, PROTOCOL_VERSION
        ));
    }
    let name = sanitize_display_name(&join.player_name)
        .ok_or_else(|| "Invalid player name".to_string())?;
    let slot = PlayerSlot::try_acquire(Arc::clone(&state.player_count), state.config.max_players)
        .ok_or_else(|| "Arena is full".to_string())?;
    Ok((Player::new(state.allocate_player_id(), name), slot))
}

/// Send one message on a socket that has no writer task yet.
async fn send_direct(ws_sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> bool {
    let data = match encode_server_message(msg) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode handshake response");
            return false;
        },
    };
    if let Err(e) = ws_sender.send(Message::Binary(data.into())).await {
        tracing::warn!(error = %e, "Failed to send handshake response");
        return false;
    }
    true
}

fn spawn_writer(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: broadcast::Receiver<Bytes>,
    player_id: PlayerId,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(data) => {
                    if ws_sender.send(Message::Binary(data)).await.is_err() {
                        break;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(player_id, "Connection lagged by {n} messages");
                },
                Err(broadcast::error::RecvError::Closed) => {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    break;
                },
            }
        }
    })
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Returns true if the message is allowed; false if rate-limited.
    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

async fn read_loop(
    ws_receiver: &mut SplitStream<WebSocket>,
    state: &AppState,
    player_id: PlayerId,
) {
    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let data = match msg {
            Message::Binary(d) => d,
            Message::Close(_) => break,
            _ => continue,
        };

        if !rate_limiter.allow() {
            tracing::warn!(player_id, "Rate limited");
            continue;
        }
        if data.is_empty() || data.len() > MAX_MESSAGE_SIZE {
            tracing::debug!(player_id, len = data.len(), "Dropped message with bad size");
            continue;
        }

        let msg_type = match decode_message_type(&data) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!(player_id, error = %e, "Dropped message with unknown type");
                continue;
            },
        };
        if msg_type.is_host_only() {
            tracing::warn!(player_id, ?msg_type, "Rejected server-only message from client");
            continue;
        }

        let message = match decode_client_message(&data) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(player_id, ?msg_type, error = %e, "Malformed client message");
                continue;
            },
        };
        let leaving = matches!(message, ClientMessage::Leave(_));
        if state
            .session_tx
            .send(SessionCommand::Client { player_id, message })
            .is_err()
        {
            tracing::error!(player_id, "{}", ServerError::SessionClosed);
            break;
        }
        if leaving {
            break;
        }
    }
}
