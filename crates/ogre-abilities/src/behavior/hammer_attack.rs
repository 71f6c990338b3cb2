use std::collections::HashSet;

use glam::Vec3;
use ogre_core::player::PlayerId;

use super::{Flow, HookCx, damage_victims, new_victims};
use crate::config::HammerAttackConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HammerStage {
    WindUp,
    Recovery,
}

/// Wind-up, one area strike in front of the owner, then recovery.
#[derive(Debug, Clone)]
pub struct HammerAttack {
    config: HammerAttackConfig,
    stage: HammerStage,
    victims: HashSet<PlayerId>,
}

impl HammerAttack {
    pub fn new(config: &HammerAttackConfig) -> Self {
        Self {
            config: config.clone(),
            stage: HammerStage::WindUp,
            victims: HashSet::new(),
        }
    }

    pub fn stage(&self) -> HammerStage {
        self.stage
    }

    pub(super) fn on_start(&mut self, cx: &mut HookCx<'_>) -> Flow {
        if cx.world.player_pose(cx.owner).is_none() {
            tracing::warn!(player_id = cx.owner, "Hammer attack without a pose, ending");
            return Flow::Finish;
        }
        if cx.world.combat().is_none() {
            tracing::warn!(player_id = cx.owner, "Hammer attack without combat service, ending");
            return Flow::Finish;
        }
        self.stage = HammerStage::WindUp;
        self.victims.clear();
        Flow::Continue
    }

    pub(super) fn on_update(&mut self, cx: &mut HookCx<'_>, _dt: f32) -> Flow {
        if self.stage == HammerStage::WindUp && cx.elapsed >= self.config.windup_secs {
            self.stage = HammerStage::Recovery;
            if !self.strike(cx) {
                return Flow::Finish;
            }
        }
        if self.stage == HammerStage::Recovery
            && cx.elapsed >= self.config.windup_secs + self.config.recovery_secs
        {
            return Flow::Finish;
        }
        Flow::Continue
    }

    pub(super) fn on_end(&mut self, _cx: &mut HookCx<'_>) {
        self.victims.clear();
    }

    fn strike(&mut self, cx: &mut HookCx<'_>) -> bool {
        let Some(pose) = cx.world.player_pose(cx.owner) else {
            tracing::warn!(player_id = cx.owner, "Hammer owner lost its pose");
            return false;
        };
        let center =
            pose.position + pose.forward() * self.config.reach + Vec3::Y * self.config.height;
        let hits = cx
            .world
            .physics()
            .overlap_sphere(center, self.config.radius, self.config.layer_mask);
        let victims = new_victims(cx, hits, &mut self.victims);
        tracing::debug!(player_id = cx.owner, victims = victims.len(), "Hammer strike");
        damage_victims(cx, &victims, self.config.damage)
    }
}
