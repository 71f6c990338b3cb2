pub mod config;
pub mod error;
pub mod health;
pub mod session;
pub mod state;
pub mod ws;

use axum::Router;
use axum::routing::get;
use bytes::Bytes;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;

use ogre_abilities::config::AbilityConfig;

use config::ServerConfig;
use session::{SessionBroadcast, SessionConfig, spawn_arena_session};
use state::AppState;

/// Build the Axum router and application state from a config.
///
/// Spawns the arena session and its fan-out task, so this must run inside a
/// tokio runtime.
pub fn build_app(config: ServerConfig, abilities: AbilityConfig) -> (Router<()>, AppState) {
    let (session_tx, session_rx, _handle) = spawn_arena_session(SessionConfig {
        tick_rate_hz: config.tick_rate_hz,
        abilities,
    });
    let (broadcast_tx, _) = broadcast::channel(config.limits.broadcast_capacity);
    spawn_session_broadcaster(session_rx, broadcast_tx.clone());

    let state = AppState::new(config, session_tx, broadcast_tx);

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    (app, state)
}

/// Background task that relays encoded session output to every connection.
pub fn spawn_session_broadcaster(
    mut session_rx: mpsc::UnboundedReceiver<SessionBroadcast>,
    broadcast_tx: broadcast::Sender<Bytes>,
) {
    tokio::spawn(async move {
        while let Some(msg) = session_rx.recv().await {
            match msg {
                SessionBroadcast::EncodedMessage(data) => {
                    // No subscribers is fine: nobody is connected yet.
                    let _ = broadcast_tx.send(data);
                },
                SessionBroadcast::SessionEnded => {
                    tracing::info!("Arena session ended, stopping broadcaster");
                    break;
                },
            }
        }
    });
}
