use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bytes::Bytes;
use tokio::sync::{broadcast, mpsc};

use ogre_core::player::PlayerId;

use crate::config::ServerConfig;
use crate::session::SessionCommand;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub session_tx: mpsc::UnboundedSender<SessionCommand>,
    /// Encoded session broadcasts, fanned out to every connection.
    pub broadcast_tx: broadcast::Sender<Bytes>,
    pub ws_connection_count: Arc<AtomicUsize>,
    pub player_count: Arc<AtomicUsize>,
    next_player_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        session_tx: mpsc::UnboundedSender<SessionCommand>,
        broadcast_tx: broadcast::Sender<Bytes>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            session_tx,
            broadcast_tx,
            ws_connection_count: Arc::new(AtomicUsize::new(0)),
            player_count: Arc::new(AtomicUsize::new(0)),
            next_player_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Ids start at 1 and are never reused within a server run.
    pub fn allocate_player_id(&self) -> PlayerId {
        self.next_player_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Counts a live WebSocket connection for as long as it is held.
#[derive(Debug)]
pub struct ConnectionGuard {
    count: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    pub fn new(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self { count }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::Relaxed);
    }
}

/// An occupied arena slot. Released on drop.
#[derive(Debug)]
pub struct PlayerSlot {
    count: Arc<AtomicUsize>,
}

impl PlayerSlot {
    /// Claim a slot unless `max` players are already admitted.
    pub fn try_acquire(count: Arc<AtomicUsize>, max: usize) -> Option<Self> {
        count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .ok()?;
        Some(Self { count })
    }
}

impl Drop for PlayerSlot {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::AcqRel);
    }
}
