use std::collections::BTreeMap;

use ogre_core::ability::AbilityName;

use crate::ability::Ability;
use crate::behavior::{AbilityBehavior, GenerateFloor, HammerAttack, NormalAttack};
use crate::config::AbilityConfig;

/// Prototype instances, one per ability name. Activations are clones.
#[derive(Debug, Clone)]
pub struct AbilityCatalog {
    prototypes: BTreeMap<AbilityName, Ability>,
}

impl AbilityCatalog {
    pub fn empty() -> Self {
        Self {
            prototypes: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &AbilityConfig) -> Self {
        let mut catalog = Self::empty();
        let normal = &config.normal_attack;
        catalog.register(Ability::new(
            AbilityBehavior::NormalAttack(NormalAttack::new(normal)),
            normal.cooldown_secs,
            normal.max_duration_secs,
        ));
        let hammer = &config.hammer_attack;
        catalog.register(Ability::new(
            AbilityBehavior::HammerAttack(HammerAttack::new(hammer)),
            hammer.cooldown_secs,
            None,
        ));
        let floor = &config.generate_floor;
        catalog.register(Ability::new(
            AbilityBehavior::GenerateFloor(GenerateFloor::new(floor)),
            floor.cooldown_secs,
            None,
        ));
        catalog
    }

    /// Replace the prototype registered under the ability's name.
    pub fn register(&mut self, prototype: Ability) {
        self.prototypes.insert(prototype.name(), prototype);
    }

    pub fn contains(&self, name: AbilityName) -> bool {
        self.prototypes.contains_key(&name)
    }

    /// A fresh instance in phase `None`.
    pub fn instantiate(&self, name: AbilityName) -> Option<Ability> {
        self.prototypes.get(&name).cloned()
    }

    pub fn cooldown_secs(&self, name: AbilityName) -> Option<f32> {
        self.prototypes.get(&name).map(|a| a.cooldown().duration())
    }
}

impl Default for AbilityCatalog {
    fn default() -> Self {
        Self::from_config(&AbilityConfig::default())
    }
}
