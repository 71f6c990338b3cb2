use serde::{Deserialize, Serialize};

use super::messages::{
    AbilityEndedMsg, AbilityRejectedMsg, AbilityStartedMsg, ClientMessage, DamageAppliedMsg,
    JoinAcceptedMsg, JoinMsg, JoinRejectedMsg, LeaveMsg, MessageType, ObjectDespawnedMsg,
    ObjectSpawnedMsg, PlayerListMsg, PlayerPoseMsg, RequestAbilityMsg, ServerMessage,
};

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Default host tick rate in Hz.
pub const DEFAULT_TICK_RATE_HZ: u32 = 30;

/// Maximum message payload size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable payload with a 1-byte type prefix.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode a `ClientMessage` to wire format.
pub fn encode_client_message(msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ClientMessage::Join(m) => encode_message(MessageType::Join, m),
        ClientMessage::Leave(m) => encode_message(MessageType::Leave, m),
        ClientMessage::RequestAbility(m) => encode_message(MessageType::RequestAbility, m),
        ClientMessage::PlayerPose(m) => encode_message(MessageType::PlayerPose, m),
    }
}

/// Encode a `ServerMessage` to wire format.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ServerMessage::JoinAccepted(m) => encode_message(MessageType::JoinAccepted, m),
        ServerMessage::JoinRejected(m) => encode_message(MessageType::JoinRejected, m),
        ServerMessage::PlayerList(m) => encode_message(MessageType::PlayerList, m),
        ServerMessage::AbilityStarted(m) => encode_message(MessageType::AbilityStarted, m),
        ServerMessage::AbilityEnded(m) => encode_message(MessageType::AbilityEnded, m),
        ServerMessage::AbilityRejected(m) => encode_message(MessageType::AbilityRejected, m),
        ServerMessage::DamageApplied(m) => encode_message(MessageType::DamageApplied, m),
        ServerMessage::ObjectSpawned(m) => encode_message(MessageType::ObjectSpawned, m),
        ServerMessage::ObjectDespawned(m) => encode_message(MessageType::ObjectDespawned, m),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    MessageType::from_byte(data[0]).ok_or(ProtocolError::UnknownMessageType(data[0]))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a `ClientMessage`.
pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::Join => Ok(ClientMessage::Join(decode_payload::<JoinMsg>(data)?)),
        MessageType::Leave => Ok(ClientMessage::Leave(decode_payload::<LeaveMsg>(data)?)),
        MessageType::RequestAbility => Ok(ClientMessage::RequestAbility(decode_payload::<
            RequestAbilityMsg,
        >(data)?)),
        MessageType::PlayerPose => Ok(ClientMessage::PlayerPose(
            decode_payload::<PlayerPoseMsg>(data)?,
        )),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}

/// Decode raw wire data into a `ServerMessage`.
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::JoinAccepted => Ok(ServerMessage::JoinAccepted(decode_payload::<
            JoinAcceptedMsg,
        >(data)?)),
        MessageType::JoinRejected => Ok(ServerMessage::JoinRejected(decode_payload::<
            JoinRejectedMsg,
        >(data)?)),
        MessageType::PlayerList => Ok(ServerMessage::PlayerList(decode_payload::<PlayerListMsg>(
            data,
        )?)),
        MessageType::AbilityStarted => Ok(ServerMessage::AbilityStarted(decode_payload::<
            AbilityStartedMsg,
        >(data)?)),
        MessageType::AbilityEnded => Ok(ServerMessage::AbilityEnded(decode_payload::<
            AbilityEndedMsg,
        >(data)?)),
        MessageType::AbilityRejected => Ok(ServerMessage::AbilityRejected(decode_payload::<
            AbilityRejectedMsg,
        >(data)?)),
        MessageType::DamageApplied => Ok(ServerMessage::DamageApplied(decode_payload::<
            DamageAppliedMsg,
        >(data)?)),
        MessageType::ObjectSpawned => Ok(ServerMessage::ObjectSpawned(decode_payload::<
            ObjectSpawnedMsg,
        >(data)?)),
        MessageType::ObjectDespawned => Ok(ServerMessage::ObjectDespawned(decode_payload::<
            ObjectDespawnedMsg,
        >(data)?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}
