//! In-memory arena that provides the services abilities call into.
//!
//! Every side effect is recorded as a [`WorldEvent`] so the host can turn
//! it into a broadcast.

use std::collections::BTreeMap;

use glam::Vec3;
use ogre_core::ability::AbilityName;
use ogre_core::net::messages::{
    DamageAppliedMsg, ObjectDespawnedMsg, ObjectSpawnedMsg, ServerMessage,
};
use ogre_core::object::{ObjectId, ObjectKind};
use ogre_core::player::PlayerId;
use ogre_core::pose::Pose;

use crate::collision::{ColliderId, CollisionWorld, PhysicsQuery, Shape, layers};
use crate::world::{AbilityWorld, CombatService, ObjectSpawner, SpawnRequest};

pub const DEFAULT_MAX_HEALTH: f32 = 100.0;
/// Radius of a player's body sphere.
pub const PLAYER_RADIUS: f32 = 0.5;
/// Height of the body sphere's center above the player's feet.
pub const PLAYER_CENTER_HEIGHT: f32 = 1.0;
pub const DEFAULT_MAX_OBJECTS: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Damage(DamageAppliedMsg),
    Spawned(ObjectSpawnedMsg),
    Despawned(ObjectDespawnedMsg),
}

impl From<WorldEvent> for ServerMessage {
    fn from(event: WorldEvent) -> Self {
        match event {
            WorldEvent::Damage(m) => ServerMessage::DamageApplied(m),
            WorldEvent::Spawned(m) => ServerMessage::ObjectSpawned(m),
            WorldEvent::Despawned(m) => ServerMessage::ObjectDespawned(m),
        }
    }
}

#[derive(Debug, Clone)]
struct Body {
    pose: Pose,
    collider: ColliderId,
    health: f32,
}

#[derive(Debug, Clone)]
struct SpawnedObject {
    collider: ColliderId,
}

fn body_center(pose: &Pose) -> Vec3 {
    pose.position + Vec3::Y * PLAYER_CENTER_HEIGHT
}

/// World-axis half extents of a box rotated by `yaw` around Y.
fn rotated_half_extents(half: Vec3, yaw: f32) -> Vec3 {
    let (s, c) = yaw.sin_cos();
    let (s, c) = (s.abs(), c.abs());
    Vec3::new(c * half.x + s * half.z, half.y, s * half.x + c * half.z)
}

#[derive(Debug)]
struct ArenaState {
    collision: CollisionWorld,
    bodies: BTreeMap<PlayerId, Body>,
    objects: BTreeMap<ObjectId, SpawnedObject>,
    next_object_id: ObjectId,
    max_objects: usize,
    events: Vec<WorldEvent>,
}

impl CombatService for ArenaState {
    fn apply_damage(
        &mut self,
        source: PlayerId,
        target: PlayerId,
        ability: AbilityName,
        amount: f32,
    ) -> Option<f32> {
        let body = self.bodies.get_mut(&target)?;
        body.health = (body.health - amount.max(0.0)).max(0.0);
        let remaining = body.health;
        self.events.push(WorldEvent::Damage(DamageAppliedMsg {
            source,
            target,
            ability,
            amount,
            remaining_health: remaining,
        }));
        Some(remaining)
    }
}

impl ObjectSpawner for ArenaState {
    fn spawn(&mut self, request: SpawnRequest) -> Option<ObjectId> {
        if self.objects.len() >= self.max_objects {
            tracing::debug!(owner = request.owner, "Object limit reached");
            return None;
        }
        let half = rotated_half_extents(request.half_extents, request.pose.yaw);
        let layer = match request.kind {
            ObjectKind::Floor => layers::FLOOR,
        };
        let collider = self.collision.insert(
            Shape::aabb_from_center(request.pose.position, half),
            layer,
            None,
        );
        self.next_object_id = self.next_object_id.wrapping_add(1);
        let object_id = self.next_object_id;
        self.objects.insert(object_id, SpawnedObject { collider });
        self.events.push(WorldEvent::Spawned(ObjectSpawnedMsg {
            object_id,
            kind: request.kind,
            owner: request.owner,
            pose: request.pose,
            half_extents: request.half_extents,
        }));
        Some(object_id)
    }

    fn despawn(&mut self, id: ObjectId) -> bool {
        let Some(object) = self.objects.remove(&id) else {
            return false;
        };
        self.collision.remove(object.collider);
        self.events
            .push(WorldEvent::Despawned(ObjectDespawnedMsg { object_id: id }));
        true
    }
}

/// Arena world with player bodies, health and spawned objects.
///
/// Combat and spawning can be switched off to model peers or tests that
/// lack those services.
#[derive(Debug)]
pub struct ArenaWorld {
    state: ArenaState,
    combat_enabled: bool,
    spawner_enabled: bool,
}

impl Default for ArenaWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaWorld {
    pub fn new() -> Self {
        Self {
            state: ArenaState {
                collision: CollisionWorld::new(),
                bodies: BTreeMap::new(),
                objects: BTreeMap::new(),
                next_object_id: 0,
                max_objects: DEFAULT_MAX_OBJECTS,
                events: Vec::new(),
            },
            combat_enabled: true,
            spawner_enabled: true,
        }
    }

    pub fn without_combat(mut self) -> Self {
        self.combat_enabled = false;
        self
    }

    pub fn without_spawner(mut self) -> Self {
        self.spawner_enabled = false;
        self
    }

    pub fn with_max_objects(mut self, max: usize) -> Self {
        self.state.max_objects = max;
        self
    }

    /// Add (or reset) a player's body at `pose` with full health.
    pub fn add_player(&mut self, player: PlayerId, pose: Pose) {
        self.remove_player(player);
        let collider = self.state.collision.insert(
            Shape::Sphere {
                center: body_center(&pose),
                radius: PLAYER_RADIUS,
            },
            layers::PLAYER,
            Some(player),
        );
        self.state.bodies.insert(
            player,
            Body {
                pose,
                collider,
                health: DEFAULT_MAX_HEALTH,
            },
        );
    }

    pub fn remove_player(&mut self, player: PlayerId) -> bool {
        let Some(body) = self.state.bodies.remove(&player) else {
            return false;
        };
        self.state.collision.remove(body.collider);
        true
    }

    pub fn set_pose(&mut self, player: PlayerId, pose: Pose) -> bool {
        let Some(body) = self.state.bodies.get_mut(&player) else {
            return false;
        };
        body.pose = pose;
        self.state.collision.move_to(body.collider, body_center(&pose))
    }

    pub fn health(&self, player: PlayerId) -> Option<f32> {
        self.state.bodies.get(&player).map(|b| b.health)
    }

    pub fn player_count(&self) -> usize {
        self.state.bodies.len()
    }

    pub fn object_count(&self) -> usize {
        self.state.objects.len()
    }

    pub fn has_object(&self, id: ObjectId) -> bool {
        self.state.objects.contains_key(&id)
    }

    pub fn collision(&self) -> &CollisionWorld {
        &self.state.collision
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.state.events)
    }

    /// Drain recorded events as host broadcasts.
    pub fn drain_messages(&mut self) -> Vec<ServerMessage> {
        self.drain_events().into_iter().map(ServerMessage::from).collect()
    }
}

impl AbilityWorld for ArenaWorld {
    fn player_pose(&self, player: PlayerId) -> Option<Pose> {
        self.state.bodies.get(&player).map(|b| b.pose)
    }

    fn physics(&self) -> &dyn PhysicsQuery {
        &self.state.collision
    }

    fn combat(&mut self) -> Option<&mut dyn CombatService> {
        if self.combat_enabled {
            Some(&mut self.state)
        } else {
            None
        }
    }

    fn spawner(&mut self) -> Option<&mut dyn ObjectSpawner> {
        if self.spawner_enabled {
            Some(&mut self.state)
        } else {
            None
        }
    }
}
