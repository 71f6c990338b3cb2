//! Services an ability calls into while it runs.
//!
//! Behaviours only see the world through [`AbilityWorld`]. Combat and
//! spawning are optional: a world that cannot provide one returns `None`,
//! and the ability that needed it ends itself.

use glam::Vec3;
use ogre_core::ability::AbilityName;
use ogre_core::object::{ObjectId, ObjectKind};
use ogre_core::player::PlayerId;
use ogre_core::pose::Pose;

use crate::collision::PhysicsQuery;

pub trait CombatService {
    /// Apply `amount` damage to `target`. Returns the target's remaining
    /// health, or `None` when the target is unknown.
    fn apply_damage(
        &mut self,
        source: PlayerId,
        target: PlayerId,
        ability: AbilityName,
        amount: f32,
    ) -> Option<f32>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: ObjectKind,
    pub owner: PlayerId,
    pub pose: Pose,
    pub half_extents: Vec3,
}

pub trait ObjectSpawner {
    /// Returns `None` when the object could not be placed.
    fn spawn(&mut self, request: SpawnRequest) -> Option<ObjectId>;

    fn despawn(&mut self, id: ObjectId) -> bool;
}

pub trait AbilityWorld {
    fn player_pose(&self, player: PlayerId) -> Option<Pose>;

    fn physics(&self) -> &dyn PhysicsQuery;

    fn combat(&mut self) -> Option<&mut dyn CombatService>;

    fn spawner(&mut self) -> Option<&mut dyn ObjectSpawner>;
}
