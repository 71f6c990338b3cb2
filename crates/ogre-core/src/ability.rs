use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

/// Identity of an ability. At most one instance per name runs per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityName {
    NormalAttack,
    HammerAttack,
    GenerateFloor,
    /// Stop-only sentinel addressing every running ability of a player.
    All,
}

impl AbilityName {
    /// Every concrete (startable) ability.
    pub const PLAYABLE: [AbilityName; 3] = [
        AbilityName::NormalAttack,
        AbilityName::HammerAttack,
        AbilityName::GenerateFloor,
    ];

    pub fn is_sentinel(self) -> bool {
        self == AbilityName::All
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NormalAttack => "normal_attack",
            Self::HammerAttack => "hammer_attack",
            Self::GenerateFloor => "generate_floor",
            Self::All => "all",
        }
    }
}

impl fmt::Display for AbilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a trigger starts or stops an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Start,
    Stop,
}

/// A single trigger request. Created per input event and passed by value,
/// including across the network boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityContext {
    pub action: ActionType,
    pub source_player: PlayerId,
    pub ability: AbilityName,
}

impl AbilityContext {
    pub fn start(source_player: PlayerId, ability: AbilityName) -> Self {
        Self {
            action: ActionType::Start,
            source_player,
            ability,
        }
    }

    pub fn stop(source_player: PlayerId, ability: AbilityName) -> Self {
        Self {
            action: ActionType::Stop,
            source_player,
            ability,
        }
    }
}

/// Lifecycle stage of one ability activation.
///
/// Ordered: an instance's phase never compares lower than it did earlier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum AbilityPhase {
    #[default]
    None,
    Started,
    Active,
    Ending,
    Ended,
}

impl AbilityPhase {
    /// Started or Active: the instance still blocks a duplicate start.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Started | Self::Active)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Ended
    }
}

/// Why an ability request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// An instance with the same name is already running for the player.
    AlreadyActive,
    /// The ability's cooldown has not finished.
    OnCooldown,
    /// No prototype is registered under that name.
    UnknownAbility,
    /// The requesting peer does not own `source_player`.
    NotOwner,
    /// A stop request named an ability that is not running.
    NotRunning,
    /// The action does not apply, e.g. starting the `All` sentinel.
    InvalidAction,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActive => write!(f, "ability already active"),
            Self::OnCooldown => write!(f, "ability on cooldown"),
            Self::UnknownAbility => write!(f, "unknown ability"),
            Self::NotOwner => write!(f, "request not sent by the owning player"),
            Self::NotRunning => write!(f, "ability not running"),
            Self::InvalidAction => write!(f, "invalid action for ability"),
        }
    }
}

impl std::error::Error for RejectReason {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_ordered_by_lifecycle() {
        assert!(AbilityPhase::None < AbilityPhase::Started);
        assert!(AbilityPhase::Started < AbilityPhase::Active);
        assert!(AbilityPhase::Active < AbilityPhase::Ending);
        assert!(AbilityPhase::Ending < AbilityPhase::Ended);
    }

    #[test]
    fn running_phases() {
        assert!(!AbilityPhase::None.is_running());
        assert!(AbilityPhase::Started.is_running());
        assert!(AbilityPhase::Active.is_running());
        assert!(!AbilityPhase::Ending.is_running());
        assert!(AbilityPhase::Ended.is_terminal());
    }

    #[test]
    fn playable_excludes_sentinel() {
        assert!(!AbilityName::PLAYABLE.iter().any(|n| n.is_sentinel()));
        assert!(AbilityName::All.is_sentinel());
    }

    #[test]
    fn context_constructors_set_action() {
        let start = AbilityContext::start(3, AbilityName::HammerAttack);
        assert_eq!(start.action, ActionType::Start);
        assert_eq!(start.source_player, 3);
        let stop = AbilityContext::stop(3, AbilityName::All);
        assert_eq!(stop.action, ActionType::Stop);
    }

    #[test]
    fn reject_reason_display() {
        assert_eq!(RejectReason::OnCooldown.to_string(), "ability on cooldown");
        assert!(RejectReason::NotOwner.to_string().contains("owning"));
    }
}
