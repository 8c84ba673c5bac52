use serde::{Deserialize, Serialize};

use super::messages::{
    CanvasSnapshotMsg, ChatMsg, ClientMessage, JoinMsg, MessageType, RoomAssignedMsg, ScoreMsg,
    ServerChatMsg, ServerMessage, SnapshotDeliverMsg, SnapshotRequestMsg, StrokeBroadcastMsg,
    StrokeUpdateMsg,
};

/// Maximum message payload size in bytes. Canvas snapshots dominate this
/// budget; stroke and chat messages are a few dozen bytes.
pub const MAX_MESSAGE_SIZE: usize = 512 * 1024; // 512 KiB

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
                write!(f, "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})")
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
        ClientMessage::StrokeUpdate(m) => encode_message(MessageType::StrokeUpdate, m),
        ClientMessage::ClearRequest => encode_message(MessageType::ClearRequest, &()),
        ClientMessage::Chat(m) => encode_message(MessageType::Chat, m),
        ClientMessage::CanvasSnapshot(m) => encode_message(MessageType::CanvasSnapshot, m),
    }
}

/// Encode a `ServerMessage` to wire format.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ServerMessage::RoomAssigned(m) => encode_message(MessageType::RoomAssigned, m),
        ServerMessage::ClearCanvas => encode_message(MessageType::ClearCanvas, &()),
        ServerMessage::ScoreDisplay(m) => encode_message(MessageType::ScoreDisplay, m),
        ServerMessage::ScoreUpdate(m) => encode_message(MessageType::ScoreUpdate, m),
        ServerMessage::StrokeBroadcast(m) => encode_message(MessageType::StrokeBroadcast, m),
        ServerMessage::Chat(m) => encode_message(MessageType::ServerChat, m),
        ServerMessage::ClearChat => encode_message(MessageType::ClearChat, &()),
        ServerMessage::SnapshotRequest(m) => encode_message(MessageType::SnapshotRequest, m),
        ServerMessage::SnapshotDeliver(m) => encode_message(MessageType::SnapshotDeliver, m),
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
        MessageType::StrokeUpdate => Ok(ClientMessage::StrokeUpdate(decode_payload::<
            StrokeUpdateMsg,
        >(data)?)),
        MessageType::ClearRequest => Ok(ClientMessage::ClearRequest),
        MessageType::Chat => Ok(ClientMessage::Chat(decode_payload::<ChatMsg>(data)?)),
        MessageType::CanvasSnapshot => Ok(ClientMessage::CanvasSnapshot(decode_payload::<
            CanvasSnapshotMsg,
        >(data)?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}

/// Decode raw wire data into a `ServerMessage`.
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::RoomAssigned => Ok(ServerMessage::RoomAssigned(decode_payload::<
            RoomAssignedMsg,
        >(data)?)),
        MessageType::ClearCanvas => Ok(ServerMessage::ClearCanvas),
        MessageType::ScoreDisplay => Ok(ServerMessage::ScoreDisplay(decode_payload::<ScoreMsg>(
            data,
        )?)),
        MessageType::ScoreUpdate => Ok(ServerMessage::ScoreUpdate(decode_payload::<ScoreMsg>(
            data,
        )?)),
        MessageType::StrokeBroadcast => Ok(ServerMessage::StrokeBroadcast(decode_payload::<
            StrokeBroadcastMsg,
        >(data)?)),
        MessageType::ServerChat => Ok(ServerMessage::Chat(decode_payload::<ServerChatMsg>(data)?)),
        MessageType::ClearChat => Ok(ServerMessage::ClearChat),
        MessageType::SnapshotRequest => Ok(ServerMessage::SnapshotRequest(decode_payload::<
            SnapshotRequestMsg,
        >(data)?)),
        MessageType::SnapshotDeliver => Ok(ServerMessage::SnapshotDeliver(decode_payload::<
            SnapshotDeliverMsg,
        >(data)?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}
