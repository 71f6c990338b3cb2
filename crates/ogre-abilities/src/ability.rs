//! Phase state machine for a single ability instance.

use ogre_core::ability::{AbilityContext, AbilityName, AbilityPhase, ActionType, RejectReason};
use ogre_core::player::PlayerId;

use crate::behavior::{AbilityBehavior, Flow, HookCx};
use crate::cooldown::CooldownManager;
use crate::world::AbilityWorld;

/// One ability activation.
///
/// Instances are cloned from a catalog prototype in phase `None` and move
/// forward through `Started`, `Active`, `Ending` to `Ended`; the phase never
/// goes back.
#[derive(Debug, Clone)]
pub struct Ability {
    name: AbilityName,
    phase: AbilityPhase,
    cooldown: CooldownManager,
    context: Option<AbilityContext>,
    elapsed: f32,
    max_duration: Option<f32>,
    behavior: AbilityBehavior,
}

impl Ability {
    pub fn new(behavior: AbilityBehavior, cooldown_secs: f32, max_duration: Option<f32>) -> Self {
        Self {
            name: behavior.name(),
            phase: AbilityPhase::None,
            cooldown: CooldownManager::new(cooldown_secs),
            context: None,
            elapsed: 0.0,
            max_duration,
            behavior,
        }
    }

    pub fn name(&self) -> AbilityName {
        self.name
    }

    pub fn phase(&self) -> AbilityPhase {
        self.phase
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.context.map(|c| c.source_player)
    }

    pub fn context(&self) -> Option<&AbilityContext> {
        self.context.as_ref()
    }

    pub fn cooldown(&self) -> &CooldownManager {
        &self.cooldown
    }

    /// Seconds spent in `Active`.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn behavior(&self) -> &AbilityBehavior {
        &self.behavior
    }

    /// Arm the instance from a start trigger.
    ///
    /// On rejection nothing changes.
    pub fn try_initialize_with_trigger(
        &mut self,
        context: AbilityContext,
        already_active: bool,
    ) -> Result<(), RejectReason> {
        if context.action != ActionType::Start || context.ability != self.name {
            return Err(RejectReason::InvalidAction);
        }
        if already_active || self.phase != AbilityPhase::None {
            return Err(RejectReason::AlreadyActive);
        }
        self.context = Some(context);
        self.elapsed = 0.0;
        self.phase = AbilityPhase::Started;
        Ok(())
    }

    /// Advance one tick. Returns `true` on the tick the instance reaches `Ended`.
    pub fn tick(&mut self, dt: f32, world: &mut dyn AbilityWorld) -> bool {
        // Without a trigger the phase is None or Ended: nothing to run.
        let Some(owner) = self.owner() else {
            return false;
        };

        match self.phase {
            AbilityPhase::None | AbilityPhase::Ended => false,
            AbilityPhase::Started => {
                self.phase = AbilityPhase::Active;
                self.cooldown.start();
                let mut cx = self.hook_cx(owner, world);
                if self.behavior.on_start(&mut cx) == Flow::Finish {
                    self.force_end();
                }
                false
            },
            AbilityPhase::Active => {
                self.elapsed += dt.max(0.0);
                let mut cx = self.hook_cx(owner, world);
                if self.behavior.on_update(&mut cx, dt) == Flow::Finish {
                    self.force_end();
                } else if let Some(max) = self.max_duration
                    && self.elapsed >= max
                {
                    tracing::debug!(player_id = owner, ability = %self.name, "Ability timed out");
                    self.force_end();
                }
                false
            },
            AbilityPhase::Ending => {
                let mut cx = self.hook_cx(owner, world);
                self.behavior.on_end(&mut cx);
                self.phase = AbilityPhase::Ended;
                true
            },
        }
    }

    fn hook_cx<'w>(&self, owner: PlayerId, world: &'w mut dyn AbilityWorld) -> HookCx<'w> {
        HookCx {
            owner,
            ability: self.name,
            elapsed: self.elapsed,
            world,
        }
    }

    /// Request the end of this activation.
    ///
    /// `Started`/`Active` move to `Ending` so `on_end` still runs; an
    /// untriggered instance goes straight to `Ended`. Ending from `Started`
    /// skips `on_start` but still costs the cooldown.
    pub fn force_end(&mut self) {
        match self.phase {
            AbilityPhase::None => self.phase = AbilityPhase::Ended,
            AbilityPhase::Started => {
                self.cooldown.start();
                self.phase = AbilityPhase::Ending;
            },
            AbilityPhase::Active => self.phase = AbilityPhase::Ending,
            AbilityPhase::Ending | AbilityPhase::Ended => {},
        }
    }

    /// End immediately, running `on_end` if the ability got that far.
    pub fn finish_now(&mut self, world: &mut dyn AbilityWorld) {
        self.force_end();
        if self.phase == AbilityPhase::Ending {
            self.tick(0.0, world);
        }
    }

    /// Per-frame state every peer computes, authority or mirror.
    /// Returns `true` when the cooldown completes.
    pub fn calculate_shared_variables(&mut self, dt: f32) -> bool {
        self.cooldown.tick(dt)
    }

    /// Start as a non-authority mirror: no gameplay hooks run.
    pub fn mirror_start(&mut self, context: AbilityContext) -> bool {
        if self.phase != AbilityPhase::None || context.ability != self.name {
            return false;
        }
        self.context = Some(context);
        self.elapsed = 0.0;
        self.phase = AbilityPhase::Active;
        self.cooldown.start();
        true
    }

    /// Move a mirror from `Ending` to `Ended`. Returns `true` if it did.
    pub fn settle(&mut self) -> bool {
        if self.phase == AbilityPhase::Ending {
            self.phase = AbilityPhase::Ended;
            return true;
        }
        false
    }
}
