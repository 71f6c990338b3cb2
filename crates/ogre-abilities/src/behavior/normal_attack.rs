use std::collections::HashSet;

use ogre_core::player::PlayerId;
use smallvec::SmallVec;

use super::{Flow, HookCx, damage_victims, new_victims};
use crate::collision::ColliderId;
use crate::config::NormalAttackConfig;
use crate::hitbox::{HitboxManager, frame_at};

/// Melee swing driven by a hitbox timeline.
#[derive(Debug, Clone)]
pub struct NormalAttack {
    damage: f32,
    hitbox: HitboxManager,
    victims: HashSet<PlayerId>,
}

impl NormalAttack {
    pub fn new(config: &NormalAttackConfig) -> Self {
        Self {
            damage: config.damage,
            hitbox: HitboxManager::new(config.timeline.clone()),
            victims: HashSet::new(),
        }
    }

    pub(super) fn on_start(&mut self, cx: &mut HookCx<'_>) -> Flow {
        if cx.world.player_pose(cx.owner).is_none() {
            tracing::warn!(player_id = cx.owner, "Normal attack without a pose, ending");
            return Flow::Finish;
        }
        if cx.world.combat().is_none() {
            tracing::warn!(player_id = cx.owner, "Normal attack without combat service, ending");
            return Flow::Finish;
        }
        self.hitbox.reset();
        self.victims.clear();
        Flow::Continue
    }

    pub(super) fn on_update(&mut self, cx: &mut HookCx<'_>, _dt: f32) -> Flow {
        let Some(pose) = cx.world.player_pose(cx.owner) else {
            tracing::warn!(player_id = cx.owner, "Attacker lost its pose, ending");
            return Flow::Finish;
        };
        let frame = frame_at(cx.elapsed);

        let mut hits: SmallVec<[ColliderId; 8]> = SmallVec::new();
        self.hitbox
            .tick(frame, &pose, cx.world.physics(), |_, id| hits.push(id));

        let victims = new_victims(cx, hits, &mut self.victims);
        if !damage_victims(cx, &victims, self.damage) {
            return Flow::Finish;
        }

        if self.hitbox.is_finished() {
            Flow::Finish
        } else {
            Flow::Continue
        }
    }

    pub(super) fn on_end(&mut self, _cx: &mut HookCx<'_>) {
        self.victims.clear();
    }

    pub fn victims(&self) -> &HashSet<PlayerId> {
        &self.victims
    }
}
