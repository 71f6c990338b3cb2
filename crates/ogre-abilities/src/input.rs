//! Declarative mapping from button edges and collisions to ability triggers.

use ogre_core::ability::{AbilityContext, AbilityName, ActionType};
use ogre_core::player::PlayerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Attack,
    Special,
    Jump,
    Interact,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::Attack, Button::Special, Button::Jump, Button::Interact];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Pressed buttons for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState(u8);

impl ButtonState {
    pub fn pressed(buttons: &[Button]) -> Self {
        let mut state = Self::default();
        for b in buttons {
            state.set(*b, true);
        }
        state
    }

    pub fn set(&mut self, button: Button, down: bool) {
        if down {
            self.0 |= button.bit();
        } else {
            self.0 &= !button.bit();
        }
    }

    pub fn is_pressed(self, button: Button) -> bool {
        self.0 & button.bit() != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonEdge {
    /// Pressed this tick, up the tick before.
    Tap,
    /// Fires once after being held for `ticks` consecutive ticks.
    Hold { ticks: u32 },
    /// Released this tick.
    Release,
}

/// A contact reported by the physics layer this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub layer: u32,
    pub other: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerCondition {
    Button { button: Button, edge: ButtonEdge },
    Collision { layer_mask: u32 },
}

/// One `(condition, ability, action)` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityTrigger {
    pub condition: TriggerCondition,
    pub ability: AbilityName,
    pub action: ActionType,
}

#[derive(Debug, Clone)]
pub struct AbilityInputHandler {
    player: PlayerId,
    has_input_authority: bool,
    triggers: Vec<AbilityTrigger>,
    previous: ButtonState,
    held_ticks: [u32; Button::ALL.len()],
}

impl AbilityInputHandler {
    pub fn new(player: PlayerId, triggers: Vec<AbilityTrigger>) -> Self {
        Self {
            player,
            has_input_authority: true,
            triggers,
            previous: ButtonState::default(),
            held_ticks: [0; Button::ALL.len()],
        }
    }

    pub fn set_input_authority(&mut self, authority: bool) {
        self.has_input_authority = authority;
    }

    pub fn has_input_authority(&self) -> bool {
        self.has_input_authority
    }

    pub fn triggers(&self) -> &[AbilityTrigger] {
        &self.triggers
    }

    /// Evaluate every trigger against this tick's input.
    ///
    /// Peers without input authority still track button state but never
    /// produce requests.
    pub fn evaluate(
        &mut self,
        current: ButtonState,
        collisions: &[CollisionEvent],
    ) -> Vec<AbilityContext> {
        for button in Button::ALL {
            let held = &mut self.held_ticks[button.index()];
            *held = if current.is_pressed(button) {
                held.saturating_add(1)
            } else {
                0
            };
        }

        let mut out = Vec::new();
        if self.has_input_authority {
            for trigger in &self.triggers {
                if self.condition_met(&trigger.condition, current, collisions) {
                    out.push(AbilityContext {
                        action: trigger.action,
                        source_player: self.player,
                        ability: trigger.ability,
                    });
                }
            }
        }
        self.previous = current;
        out
    }

    fn condition_met(
        &self,
        condition: &TriggerCondition,
        current: ButtonState,
        collisions: &[CollisionEvent],
    ) -> bool {
        match *condition {
            TriggerCondition::Button { button, edge } => {
                let now = current.is_pressed(button);
                let before = self.previous.is_pressed(button);
                match edge {
                    ButtonEdge::Tap => now && !before,
                    ButtonEdge::Release => !now && before,
                    ButtonEdge::Hold { ticks } => {
                        self.held_ticks[button.index()] == ticks.max(1)
                    },
                }
            },
            TriggerCondition::Collision { layer_mask } => {
                collisions.iter().any(|c| c.layer & layer_mask != 0)
            },
        }
    }
}
