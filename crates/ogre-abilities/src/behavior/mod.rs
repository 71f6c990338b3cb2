//! Concrete ability behaviours, dispatched by enum discriminant.

mod generate_floor;
mod hammer_attack;
mod normal_attack;

pub use generate_floor::GenerateFloor;
pub use hammer_attack::HammerAttack;
pub use normal_attack::NormalAttack;

use std::collections::HashSet;

use ogre_core::ability::AbilityName;
use ogre_core::player::PlayerId;

use crate::collision::ColliderId;
use crate::world::AbilityWorld;

/// What a hook wants the phase machine to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// End the ability: the phase machine moves to `Ending`.
    Finish,
}

/// Everything a hook can see for one call.
pub struct HookCx<'w> {
    pub owner: PlayerId,
    pub ability: AbilityName,
    /// Seconds spent in `Active`.
    pub elapsed: f32,
    pub world: &'w mut dyn AbilityWorld,
}

#[derive(Debug, Clone)]
pub enum AbilityBehavior {
    NormalAttack(NormalAttack),
    HammerAttack(HammerAttack),
    GenerateFloor(GenerateFloor),
}

impl AbilityBehavior {
    pub fn name(&self) -> AbilityName {
        match self {
            Self::NormalAttack(_) => AbilityName::NormalAttack,
            Self::HammerAttack(_) => AbilityName::HammerAttack,
            Self::GenerateFloor(_) => AbilityName::GenerateFloor,
        }
    }

    pub fn on_start(&mut self, cx: &mut HookCx<'_>) -> Flow {
        match self {
            Self::NormalAttack(b) => b.on_start(cx),
            Self::HammerAttack(b) => b.on_start(cx),
            Self::GenerateFloor(b) => b.on_start(cx),
        }
    }

    pub fn on_update(&mut self, cx: &mut HookCx<'_>, dt: f32) -> Flow {
        match self {
            Self::NormalAttack(b) => b.on_update(cx, dt),
            Self::HammerAttack(b) => b.on_update(cx, dt),
            Self::GenerateFloor(b) => b.on_update(cx, dt),
        }
    }

    pub fn on_end(&mut self, cx: &mut HookCx<'_>) {
        match self {
            Self::NormalAttack(b) => b.on_end(cx),
            Self::HammerAttack(b) => b.on_end(cx),
            Self::GenerateFloor(b) => b.on_end(cx),
        }
    }
}

/// Map hit colliders to victims, skipping the owner, non-player colliders
/// and anyone already in `seen`.
fn new_victims(
    cx: &HookCx<'_>,
    hits: impl IntoIterator<Item = ColliderId>,
    seen: &mut HashSet<PlayerId>,
) -> Vec<PlayerId> {
    let physics = cx.world.physics();
    hits.into_iter()
        .filter_map(|id| physics.collider_owner(id))
        .filter(|victim| *victim != cx.owner && seen.insert(*victim))
        .collect()
}

/// Apply `amount` to each victim. Returns `false` if there is no combat service.
fn damage_victims(cx: &mut HookCx<'_>, victims: &[PlayerId], amount: f32) -> bool {
    if victims.is_empty() {
        return true;
    }
    let (owner, ability) = (cx.owner, cx.ability);
    let Some(combat) = cx.world.combat() else {
        tracing::warn!(player_id = owner, %ability, "No combat service, dropping hits");
        return false;
    };
    for &target in victims {
        match combat.apply_damage(owner, target, ability, amount) {
            Some(remaining) => {
                tracing::debug!(
                    player_id = owner,
                    target_id = target,
                    %ability,
                    amount,
                    remaining,
                    "Hit"
                );
            },
            None => {
                tracing::debug!(
                    player_id = owner,
                    target_id = target,
                    %ability,
                    "Hit unknown target"
                );
            },
        }
    }
    true
}
