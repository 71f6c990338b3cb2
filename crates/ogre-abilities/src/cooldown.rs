use serde::{Deserialize, Serialize};

/// Where a cooldown is in its countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CooldownState {
    #[default]
    BeforeCooldown,
    CountingDown,
    AfterCooldown,
}

/// Per-ability countdown timer.
///
/// `remaining` never goes negative, and each countdown reaches
/// [`CooldownState::AfterCooldown`] exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownManager {
    duration: f32,
    remaining: f32,
    state: CooldownState,
}

impl CooldownManager {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            remaining: 0.0,
            state: CooldownState::BeforeCooldown,
        }
    }

    /// Begin (or restart) the countdown from the full duration.
    pub fn start(&mut self) {
        self.remaining = self.duration;
        self.state = CooldownState::CountingDown;
    }

    /// Advance the countdown. Returns `true` on the tick it completes.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.state != CooldownState::CountingDown {
            return false;
        }
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        if self.remaining <= 0.0 {
            self.state = CooldownState::AfterCooldown;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.remaining = 0.0;
        self.state = CooldownState::BeforeCooldown;
    }

    pub fn state(&self) -> CooldownState {
        self.state
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_counting(&self) -> bool {
        self.state == CooldownState::CountingDown
    }

    /// Fraction of the countdown still left, in `[0, 1]`. For HUD display.
    pub fn remaining_fraction(&self) -> f32 {
        if !self.is_counting() || self.duration <= 0.0 {
            return 0.0;
        }
        (self.remaining / self.duration).clamp(0.0, 1.0)
    }
}
