use glam::Vec3;
use ogre_core::ability::{AbilityName, ActionType};
use serde::{Deserialize, Serialize};

use crate::collision::layers;
use crate::hitbox::{HitboxAction, HitboxTimeline};
use crate::input::{AbilityTrigger, Button, ButtonEdge, TriggerCondition};

/// Data-driven tuning for every ability plus the default input bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    pub normal_attack: NormalAttackConfig,
    pub hammer_attack: HammerAttackConfig,
    pub generate_floor: GenerateFloorConfig,
    pub bindings: Vec<AbilityTrigger>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalAttackConfig {
    pub cooldown_secs: f32,
    /// Damage per victim per swing.
    pub damage: f32,
    /// Hard cap on how long one swing may run.
    pub max_duration_secs: Option<f32>,
    pub timeline: HitboxTimeline,
}

impl Default for NormalAttackConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 0.6,
            damage: 10.0,
            max_duration_secs: Some(1.0),
            timeline: HitboxTimeline {
                actions: vec![HitboxAction {
                    name: "swing".to_string(),
                    start_frame: 6,
                    end_frame: 18,
                    local_points: vec![
                        Vec3::new(-0.6, 1.2, 0.8),
                        Vec3::new(0.6, 1.2, 0.8),
                        Vec3::new(0.0, 1.0, 1.4),
                    ],
                    radius: 0.35,
                    layer_mask: layers::PLAYER,
                }],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HammerAttackConfig {
    pub cooldown_secs: f32,
    pub damage: f32,
    /// Delay between the trigger and the strike.
    pub windup_secs: f32,
    /// Delay after the strike before the ability ends.
    pub recovery_secs: f32,
    /// Distance in front of the owner where the strike lands.
    pub reach: f32,
    /// Height of the strike above the owner's feet.
    pub height: f32,
    pub radius: f32,
    pub layer_mask: u32,
}

impl Default for HammerAttackConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 4.0,
            damage: 35.0,
            windup_secs: 0.4,
            recovery_secs: 0.5,
            reach: 1.5,
            height: 0.5,
            radius: 1.2,
            layer_mask: layers::PLAYER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateFloorConfig {
    pub cooldown_secs: f32,
    /// Distance in front of the owner the floor is centered on.
    pub forward_offset: f32,
    /// How far below the owner's feet the floor top sits.
    pub drop: f32,
    pub half_extents: Vec3,
    /// How long the floor exists before it is removed.
    pub lifetime_secs: f32,
}

impl Default for GenerateFloorConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 8.0,
            forward_offset: 2.0,
            drop: 0.1,
            half_extents: Vec3::new(1.5, 0.1, 1.5),
            lifetime_secs: 6.0,
        }
    }
}

fn button(
    button: Button,
    edge: ButtonEdge,
    ability: AbilityName,
    action: ActionType,
) -> AbilityTrigger {
    AbilityTrigger {
        condition: TriggerCondition::Button { button, edge },
        ability,
        action,
    }
}

pub fn default_bindings() -> Vec<AbilityTrigger> {
    vec![
        button(Button::Attack, ButtonEdge::Tap, AbilityName::NormalAttack, ActionType::Start),
        button(Button::Special, ButtonEdge::Tap, AbilityName::HammerAttack, ActionType::Start),
        button(Button::Special, ButtonEdge::Release, AbilityName::HammerAttack, ActionType::Stop),
        button(
            Button::Interact,
            ButtonEdge::Hold { ticks: 15 },
            AbilityName::GenerateFloor,
            ActionType::Start,
        ),
    ]
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            normal_attack: NormalAttackConfig::default(),
            hammer_attack: HammerAttackConfig::default(),
            generate_floor: GenerateFloorConfig::default(),
            bindings: default_bindings(),
        }
    }
}

impl AbilityConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("OGRE_ABILITY_CONFIG")
            && let Some(config) = Self::load_from(&path)
        {
            return config;
        }
        Self::load_from("config/abilities.toml").unwrap_or_default()
    }

    /// Read one TOML file. Unreadable or invalid files yield `None`.
    pub fn load_from(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<Self>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path, error = %e, "Ignoring invalid ability config");
                None
            },
        }
    }
}
