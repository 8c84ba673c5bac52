use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::mpsc;

use scrawl_core::room::{ConnectionId, RoomId, SeatIndex};

use crate::error::EventError;

/// Per-connection sender for outbound WebSocket binary messages.
/// Bounded to prevent memory exhaustion from slow clients.
/// Uses `Bytes` for zero-copy cloning when broadcasting to a room.
pub type PlayerSender = mpsc::Sender<Bytes>;

/// What the registry knows about one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub sender: PlayerSender,
    /// Display name, present once the client has identified itself.
    pub name: Option<String>,
    /// Room and seat, present once a seat has been assigned.
    pub assignment: Option<(RoomId, SeatIndex)>,
}

/// Tracks every live connection's identity and seat assignment.
///
/// Owns connections for their whole lifetime; rooms hold only the
/// connection id for routing.
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionInfo>,
    next_id: ConnectionId,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_id: 1,
        }
    }

    /// Track a new transport connection. Called on WebSocket accept,
    /// before the client has identified itself.
    pub fn register(&mut self, sender: PlayerSender) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;
        self.connections.insert(
            id,
            ConnectionInfo {
                sender,
                name: None,
                assignment: None,
            },
        );
        id
    }

    pub fn get(&self, id: ConnectionId) -> Result<&ConnectionInfo, EventError> {
        self.connections.get(&id).ok_or(EventError::NotFound)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Result<&mut ConnectionInfo, EventError> {
        self.connections.get_mut(&id).ok_or(EventError::NotFound)
    }

    /// Outbound sender for a connection, if it is still live.
    pub fn sender(&self, id: ConnectionId) -> Option<&PlayerSender> {
        self.connections.get(&id).map(|c| &c.sender)
    }

    pub fn assignment(&self, id: ConnectionId) -> Option<(RoomId, SeatIndex)> {
        self.connections.get(&id).and_then(|c| c.assignment)
    }

    /// Drop a connection's registry entry (but not its room seat; the
    /// room manager handles that side).
    pub fn unregister(&mut self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.connections.remove(&id)
    }

    /// Clear a connection's seat assignment without dropping the entry.
    /// Used when a room is torn down under a still-open connection.
    pub fn clear_assignment(&mut self, id: ConnectionId) {
        if let Some(info) = self.connections.get_mut(&id) {
            info.assignment = None;
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
