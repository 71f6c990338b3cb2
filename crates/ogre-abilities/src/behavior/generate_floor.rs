use glam::Vec3;
use ogre_core::object::{ObjectId, ObjectKind};
use ogre_core::pose::Pose;

use super::{Flow, HookCx};
use crate::config::GenerateFloorConfig;
use crate::world::SpawnRequest;

/// Places a temporary floor in front of the owner.
#[derive(Debug, Clone)]
pub struct GenerateFloor {
    config: GenerateFloorConfig,
    floor: Option<ObjectId>,
}

impl GenerateFloor {
    pub fn new(config: &GenerateFloorConfig) -> Self {
        Self {
            config: config.clone(),
            floor: None,
        }
    }

    pub fn floor(&self) -> Option<ObjectId> {
        self.floor
    }

    pub(super) fn on_start(&mut self, cx: &mut HookCx<'_>) -> Flow {
        let Some(pose) = cx.world.player_pose(cx.owner) else {
            tracing::warn!(player_id = cx.owner, "Generate floor without a pose, ending");
            return Flow::Finish;
        };
        let half = self.config.half_extents;
        let center = pose.position + pose.forward() * self.config.forward_offset
            - Vec3::Y * (self.config.drop + half.y);
        let request = SpawnRequest {
            kind: ObjectKind::Floor,
            owner: cx.owner,
            pose: Pose::new(center, pose.yaw),
            half_extents: half,
        };

        let Some(spawner) = cx.world.spawner() else {
            tracing::warn!(player_id = cx.owner, "No object spawner, ending");
            return Flow::Finish;
        };
        match spawner.spawn(request) {
            Some(id) => {
                tracing::debug!(player_id = cx.owner, object_id = id, "Floor spawned");
                self.floor = Some(id);
                Flow::Continue
            },
            None => {
                tracing::warn!(player_id = cx.owner, "Floor spawn failed, ending");
                Flow::Finish
            },
        }
    }

    pub(super) fn on_update(&mut self, cx: &mut HookCx<'_>, _dt: f32) -> Flow {
        if cx.elapsed >= self.config.lifetime_secs {
            Flow::Finish
        } else {
            Flow::Continue
        }
    }

    pub(super) fn on_end(&mut self, cx: &mut HookCx<'_>) {
        let Some(id) = self.floor.take() else {
            return;
        };
        match cx.world.spawner() {
            Some(spawner) => {
                if !spawner.despawn(id) {
                    tracing::debug!(object_id = id, "Floor already gone");
                }
            },
            None => tracing::warn!(object_id = id, "No object spawner, floor left behind"),
        }
    }
}
