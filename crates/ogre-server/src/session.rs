use std::time::Duration;

use bytes::Bytes;
use glam::Vec3;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ogre_abilities::arena::ArenaWorld;
use ogre_abilities::catalog::AbilityCatalog;
use ogre_abilities::config::AbilityConfig;
use ogre_abilities::executor::{AbilityExecutor, Outbound};
use ogre_core::net::messages::{ClientMessage, PlayerListMsg, ServerMessage};
use ogre_core::net::protocol::encode_server_message;
use ogre_core::player::{Player, PlayerId};
use ogre_core::pose::Pose;

/// Radius of the ring new players are placed on.
const SPAWN_RING_RADIUS: f32 = 4.0;

/// Commands sent from WebSocket handlers to the arena session.
#[derive(Debug)]
pub enum SessionCommand {
    PlayerJoined { player: Player },
    PlayerLeft { player_id: PlayerId },
    /// A decoded message from the peer controlling `player_id`.
    Client {
        player_id: PlayerId,
        message: ClientMessage,
    },
    Stop,
}

/// Output of the session loop.
#[derive(Debug, Clone)]
pub enum SessionBroadcast {
    /// Serialized ServerMessage bytes ready to send over WebSocket.
    EncodedMessage(Bytes),
    /// The loop has exited.
    SessionEnded,
}

pub struct SessionConfig {
    pub tick_rate_hz: u32,
    pub abilities: AbilityConfig,
}

/// Spawn the authoritative arena loop as a tokio task.
pub fn spawn_arena_session(
    config: SessionConfig,
) -> (
    mpsc::UnboundedSender<SessionCommand>,
    mpsc::UnboundedReceiver<SessionBroadcast>,
    JoinHandle<()>,
) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let mut session = ArenaSession::new(&config, broadcast_tx);
        session.run(config.tick_rate_hz, cmd_rx).await;
    });

    (cmd_tx, broadcast_rx, handle)
}

/// Host executor plus the world it acts on. Owned by the session task.
struct ArenaSession {
    executor: AbilityExecutor,
    world: ArenaWorld,
    players: Vec<Player>,
    spawn_counter: u32,
    broadcast_tx: mpsc::UnboundedSender<SessionBroadcast>,
}

impl ArenaSession {
    fn new(config: &SessionConfig, broadcast_tx: mpsc::UnboundedSender<SessionBroadcast>) -> Self {
        Self {
            executor: AbilityExecutor::host(AbilityCatalog::from_config(&config.abilities)),
            world: ArenaWorld::new(),
            players: Vec::new(),
            spawn_counter: 0,
            broadcast_tx,
        }
    }

    async fn run(
        &mut self,
        tick_rate_hz: u32,
        mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    ) {
        let dt = 1.0 / tick_rate_hz.max(1) as f32;
        let mut interval = tokio::time::interval(Duration::from_secs_f32(dt));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(tick_rate_hz, "Arena session started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.executor.tick(dt, &mut self.world);
                    self.flush();
                }
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Stop) | None => break,
                        Some(cmd) => self.handle_command(cmd),
                    }
                }
            }
        }

        tracing::info!(tick = self.executor.current_tick(), "Arena session stopped");
        let _ = self.broadcast_tx.send(SessionBroadcast::SessionEnded);
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::PlayerJoined { player } => self.add_player(player),
            SessionCommand::PlayerLeft { player_id } => self.remove_player(player_id),
            SessionCommand::Client { player_id, message } => {
                self.handle_client_message(player_id, message);
            },
            SessionCommand::Stop => {},
        }
        self.flush();
    }

    fn handle_client_message(&mut self, player_id: PlayerId, message: ClientMessage) {
        match message {
            ClientMessage::RequestAbility(req) => {
                // Rejections are broadcast by the executor.
                let _ = self.executor.handle_remote_request(player_id, req.context);
            },
            ClientMessage::PlayerPose(msg) => {
                if msg.player_id != player_id {
                    tracing::warn!(
                        player_id,
                        claimed = msg.player_id,
                        "Dropped pose update for another player"
                    );
                } else if !self.world.set_pose(player_id, msg.pose) {
                    tracing::debug!(player_id, "Pose update for unknown player");
                }
            },
            ClientMessage::Leave(_) => self.remove_player(player_id),
            ClientMessage::Join(_) => {
                tracing::warn!(player_id, "Ignoring Join from an admitted player");
            },
        }
    }

    fn add_player(&mut self, player: Player) {
        if self.players.iter().any(|p| p.id == player.id) {
            tracing::warn!(player_id = player.id, "Player already in arena");
            return;
        }
        let pose = spawn_pose(self.spawn_counter);
        self.spawn_counter = self.spawn_counter.wrapping_add(1);
        self.world.add_player(player.id, pose);
        tracing::info!(player_id = player.id, name = %player.display_name, "Player entered arena");
        self.players.push(player);
        self.broadcast_player_list();
    }

    fn remove_player(&mut self, player_id: PlayerId) {
        let before = self.players.len();
        self.players.retain(|p| p.id != player_id);
        if self.players.len() == before {
            return;
        }
        self.executor.player_left(player_id, &mut self.world);
        self.world.remove_player(player_id);
        tracing::info!(player_id, "Player left arena");
        self.broadcast_player_list();
    }

    fn broadcast_player_list(&self) {
        self.send(&ServerMessage::PlayerList(PlayerListMsg {
            players: self.players.clone(),
        }));
    }

    /// Publish everything the executor and world produced, executor first.
    fn flush(&mut self) {
        for out in self.executor.drain_outbox() {
            match out {
                Outbound::Broadcast(msg) => self.send(&msg),
                Outbound::ToHost(msg) => {
                    tracing::error!(?msg, "Host executor queued a host-bound message");
                },
            }
        }
        for msg in self.world.drain_messages() {
            self.send(&msg);
        }
        for event in self.executor.drain_events() {
            tracing::debug!(?event, "Ability event");
        }
    }

    fn send(&self, msg: &ServerMessage) {
        match encode_server_message(msg) {
            Ok(data) => {
                let _ = self
                    .broadcast_tx
                    .send(SessionBroadcast::EncodedMessage(Bytes::from(data)));
            },
            Err(e) => {
                tracing::error!(
                    error = %e,
                    msg_type = ?msg.message_type(),
                    "Failed to encode broadcast"
                );
            },
        }
    }
}

/// Place the `n`th arrival on a ring around the origin, facing the center.
fn spawn_pose(n: u32) -> Pose {
    // Golden angle keeps consecutive arrivals apart.
    let angle = n as f32 * 2.399_963;
    let position = Vec3::new(angle.sin(), 0.0, angle.cos()) * SPAWN_RING_RADIUS;
    let yaw = angle + std::f32::consts::PI;
    Pose::new(position, yaw)
}
