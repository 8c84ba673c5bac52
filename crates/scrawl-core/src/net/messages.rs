use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::room::{RoomId, SeatIndex};
use crate::stroke::StrokeUpdate;

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Client -> Server
    Join = 0x01,
    StrokeUpdate = 0x02,
    ClearRequest = 0x03,
    Chat = 0x04,
    CanvasSnapshot = 0x05,

    // Server -> Client
    RoomAssigned = 0x10,
    ClearCanvas = 0x11,
    ScoreDisplay = 0x12,
    ScoreUpdate = 0x13,
    StrokeBroadcast = 0x14,
    ServerChat = 0x15,
    ClearChat = 0x16,
    SnapshotRequest = 0x17,
    SnapshotDeliver = 0x18,
}

impl MessageType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Join),
            0x02 => Some(Self::StrokeUpdate),
            0x03 => Some(Self::ClearRequest),
            0x04 => Some(Self::Chat),
            0x05 => Some(Self::CanvasSnapshot),
            0x10 => Some(Self::RoomAssigned),
            0x11 => Some(Self::ClearCanvas),
            0x12 => Some(Self::ScoreDisplay),
            0x13 => Some(Self::ScoreUpdate),
            0x14 => Some(Self::StrokeBroadcast),
            0x15 => Some(Self::ServerChat),
            0x16 => Some(Self::ClearChat),
            0x17 => Some(Self::SnapshotRequest),
            0x18 => Some(Self::SnapshotDeliver),
            _ => None,
        }
    }
}

/// First message on every connection: the client announces its display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinMsg {
    pub name: String,
    /// Stroke state carried over from the pre-join canvas, if any.
    pub stroke: Option<StrokeUpdate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeUpdateMsg {
    pub stroke: StrokeUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMsg {
    pub content: String,
}

/// Seat 0's reply to a `SnapshotRequest`: a raster image of its canvas,
/// tagged with the request's correlation token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasSnapshotMsg {
    pub token: Uuid,
    pub image: Vec<u8>,
}

/// Tells a freshly joined client which room and seat it landed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAssignedMsg {
    pub room_id: RoomId,
    pub seat: SeatIndex,
}

/// Score payload shared by the initial display and later updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMsg {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeBroadcastMsg {
    pub name: String,
    pub seat: SeatIndex,
    pub stroke: StrokeUpdate,
}

/// Chat line relayed to a room. `from` is `"server"` for system messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerChatMsg {
    pub from: String,
    pub content: String,
}

/// Asks the first-seated occupant for a raster snapshot of its canvas so a
/// late joiner can catch up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRequestMsg {
    pub token: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDeliverMsg {
    pub image: Vec<u8>,
}

/// Messages a client may send to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Join(JoinMsg),
    StrokeUpdate(StrokeUpdateMsg),
    ClearRequest,
    Chat(ChatMsg),
    CanvasSnapshot(CanvasSnapshotMsg),
}

impl ClientMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Join(_) => MessageType::Join,
            Self::StrokeUpdate(_) => MessageType::StrokeUpdate,
            Self::ClearRequest => MessageType::ClearRequest,
            Self::Chat(_) => MessageType::Chat,
            Self::CanvasSnapshot(_) => MessageType::CanvasSnapshot,
        }
    }
}

/// Messages the server may send to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    RoomAssigned(RoomAssignedMsg),
    ClearCanvas,
    ScoreDisplay(ScoreMsg),
    ScoreUpdate(ScoreMsg),
    StrokeBroadcast(StrokeBroadcastMsg),
    Chat(ServerChatMsg),
    ClearChat,
    SnapshotRequest(SnapshotRequestMsg),
    SnapshotDeliver(SnapshotDeliverMsg),
}

impl ServerMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::RoomAssigned(_) => MessageType::RoomAssigned,
            Self::ClearCanvas => MessageType::ClearCanvas,
            Self::ScoreDisplay(_) => MessageType::ScoreDisplay,
            Self::ScoreUpdate(_) => MessageType::ScoreUpdate,
            Self::StrokeBroadcast(_) => MessageType::StrokeBroadcast,
            Self::Chat(_) => MessageType::ServerChat,
            Self::ClearChat => MessageType::ClearChat,
            Self::SnapshotRequest(_) => MessageType::SnapshotRequest,
            Self::SnapshotDeliver(_) => MessageType::SnapshotDeliver,
        }
    }

    /// System chat line from the server itself.
    pub fn server_chat(content: impl Into<String>) -> Self {
        Self::Chat(ServerChatMsg {
            from: "server".to_string(),
            content: content.into(),
        })
    }
}
