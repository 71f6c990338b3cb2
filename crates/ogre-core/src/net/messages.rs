use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ability::{AbilityContext, AbilityName, RejectReason};
use crate::object::{ObjectId, ObjectKind};
use crate::player::{Player, PlayerId};
use crate::pose::Pose;

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Client -> Host
    Join = 0x01,
    Leave = 0x02,
    RequestAbility = 0x03,
    PlayerPose = 0x04,

    // Host -> Client (session)
    JoinAccepted = 0x10,
    JoinRejected = 0x11,
    PlayerList = 0x12,

    // Host -> Client (ability mirroring)
    AbilityStarted = 0x20,
    AbilityEnded = 0x21,
    AbilityRejected = 0x22,

    // Host -> Client (world effects)
    DamageApplied = 0x30,
    ObjectSpawned = 0x31,
    ObjectDespawned = 0x32,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Join),
            0x02 => Some(Self::Leave),
            0x03 => Some(Self::RequestAbility),
            0x04 => Some(Self::PlayerPose),
            0x10 => Some(Self::JoinAccepted),
            0x11 => Some(Self::JoinRejected),
            0x12 => Some(Self::PlayerList),
            0x20 => Some(Self::AbilityStarted),
            0x21 => Some(Self::AbilityEnded),
            0x22 => Some(Self::AbilityRejected),
            0x30 => Some(Self::DamageApplied),
            0x31 => Some(Self::ObjectSpawned),
            0x32 => Some(Self::ObjectDespawned),
            _ => None,
        }
    }

    /// Messages only the host may originate.
    pub fn is_host_only(self) -> bool {
        (self as u8) >= 0x10
    }
}

// ---------------------------------------------------------------------------
// Client -> Host
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinMsg {
    pub player_name: String,
    pub protocol_version: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveMsg {
    pub player_id: PlayerId,
}

/// Forwarded trigger from a non-authoritative peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestAbilityMsg {
    pub context: AbilityContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPoseMsg {
    pub player_id: PlayerId,
    pub pose: Pose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    Join(JoinMsg),
    Leave(LeaveMsg),
    RequestAbility(RequestAbilityMsg),
    PlayerPose(PlayerPoseMsg),
}

impl ClientMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Join(_) => MessageType::Join,
            Self::Leave(_) => MessageType::Leave,
            Self::RequestAbility(_) => MessageType::RequestAbility,
            Self::PlayerPose(_) => MessageType::PlayerPose,
        }
    }
}

// ---------------------------------------------------------------------------
// Host -> Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinAcceptedMsg {
    pub player_id: PlayerId,
    pub tick_rate_hz: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRejectedMsg {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerListMsg {
    pub players: Vec<Player>,
}

/// Mirror of a host-side start. Clients create a non-authority instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityStartedMsg {
    pub tick: u32,
    pub context: AbilityContext,
}

/// Mirror of a host-side end. Clients settle and drop their instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityEndedMsg {
    pub tick: u32,
    pub player_id: PlayerId,
    pub ability: AbilityName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityRejectedMsg {
    pub context: AbilityContext,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageAppliedMsg {
    pub source: PlayerId,
    pub target: PlayerId,
    pub ability: AbilityName,
    pub amount: f32,
    pub remaining_health: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpawnedMsg {
    pub object_id: ObjectId,
    pub kind: ObjectKind,
    pub owner: PlayerId,
    pub pose: Pose,
    pub half_extents: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDespawnedMsg {
    pub object_id: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    JoinAccepted(JoinAcceptedMsg),
    JoinRejected(JoinRejectedMsg),
    PlayerList(PlayerListMsg),
    AbilityStarted(AbilityStartedMsg),
    AbilityEnded(AbilityEndedMsg),
    AbilityRejected(AbilityRejectedMsg),
    DamageApplied(DamageAppliedMsg),
    ObjectSpawned(ObjectSpawnedMsg),
    ObjectDespawned(ObjectDespawnedMsg),
}

impl ServerMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::JoinAccepted(_) => MessageType::JoinAccepted,
            Self::JoinRejected(_) => MessageType::JoinRejected,
            Self::PlayerList(_) => MessageType::PlayerList,
            Self::AbilityStarted(_) => MessageType::AbilityStarted,
            Self::AbilityEnded(_) => MessageType::AbilityEnded,
            Self::AbilityRejected(_) => MessageType::AbilityRejected,
            Self::DamageApplied(_) => MessageType::DamageApplied,
            Self::ObjectSpawned(_) => MessageType::ObjectSpawned,
            Self::ObjectDespawned(_) => MessageType::ObjectDespawned,
        }
    }
}
