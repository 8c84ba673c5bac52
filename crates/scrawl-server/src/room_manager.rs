use std::collections::HashMap;

use bytes::Bytes;
use uuid::Uuid;

use scrawl_core::net::messages::ServerMessage;
use scrawl_core::net::protocol::encode_server_message;
use scrawl_core::room::{ConnectionId, Phase, Room, RoomId, Seat, SeatIndex};
use scrawl_core::stroke::StrokeUpdate;

use crate::config::DisconnectPolicy;
use crate::error::EventError;
use crate::registry::{ConnectionRegistry, PlayerSender};

/// Result of seating a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatAssignment {
    pub room_id: RoomId,
    pub seat: SeatIndex,
    /// False when the connection was already seated (duplicate identify).
    pub newly_seated: bool,
}

/// What happened to the departing connection's room.
#[derive(Debug)]
pub enum DisconnectOutcome {
    /// The connection never reached a seat.
    NotSeated,
    /// The whole room was destroyed; `evicted` lists the other occupants,
    /// whose connections are still open but no longer seated.
    RoomTornDown {
        room_id: RoomId,
        evicted: Vec<ConnectionId>,
    },
    /// Only the departing seat was freed (vacate-seat policy).
    SeatVacated {
        room_id: RoomId,
        seat: SeatIndex,
        room_emptied: bool,
    },
}

/// Owns all rooms and live connections, and provides the three broadcast
/// primitives every game-state transition is expressed through.
pub struct RoomManager {
    registry: ConnectionRegistry,
    rooms: HashMap<RoomId, Room>,
    next_room_id: RoomId,
    /// Most recently created room. New joins land here until it fills;
    /// older partially-filled rooms are never backfilled.
    latest_room: Option<RoomId>,
    /// Pending canvas-snapshot handoffs: correlation token -> requester.
    pending_snapshots: HashMap<Uuid, ConnectionId>,
    disconnect_policy: DisconnectPolicy,
}

impl RoomManager {
    pub fn new(disconnect_policy: DisconnectPolicy) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: HashMap::new(),
            next_room_id: 1,
            latest_room: None,
            pending_snapshots: HashMap::new(),
            disconnect_policy,
        }
    }

    /// Track a new transport connection (pre-identify).
    pub fn register(&mut self, sender: PlayerSender) -> ConnectionId {
        self.registry.register(sender)
    }

    /// Bind a display name to a connection and assign it a seat.
    ///
    /// Placement is sequential bin-packing: the most recently created room
    /// takes the seat if it has vacancy, otherwise a fresh room is created
    /// and the connection lands in seat 0. Idempotent: a second identify
    /// for the same connection returns the existing assignment without
    /// creating a duplicate seat.
    pub fn identify(
        &mut self,
        conn: ConnectionId,
        name: String,
        stroke: Option<StrokeUpdate>,
    ) -> Result<SeatAssignment, EventError> {
        if let Some((room_id, seat)) = self.registry.assignment(conn) {
            return Ok(SeatAssignment {
                room_id,
                seat,
                newly_seated: false,
            });
        }
        // Must be a live connection before any room is touched
        self.registry.get(conn)?;

        let reuse_latest = self
            .latest_room
            .and_then(|id| self.rooms.get(&id))
            .is_some_and(|room| !room.is_full());
        if !reuse_latest {
            let id = self.next_room_id;
            self.next_room_id += 1;
            self.rooms.insert(id, Room::new(id));
            self.latest_room = Some(id);
        }
        let room_id = self.latest_room.ok_or(EventError::NotFound)?;
        let room = self.rooms.get_mut(&room_id).ok_or(EventError::NotFound)?;
        let seat = room
            .occupy_next(Seat::new(conn, name.clone(), stroke))
            .ok_or(EventError::NotFound)?;

        let info = self.registry.get_mut(conn)?;
        info.name = Some(name);
        info.assignment = Some((room_id, seat));

        Ok(SeatAssignment {
            room_id,
            seat,
            newly_seated: true,
        })
    }

    /// Resolve a connection to its room, seat, and display name.
    pub fn lookup(&self, conn: ConnectionId) -> Result<(RoomId, SeatIndex, String), EventError> {
        let info = self.registry.get(conn)?;
        let (room_id, seat) = info.assignment.ok_or(EventError::NotFound)?;
        let name = info.name.clone().ok_or(EventError::NotFound)?;
        Ok((room_id, seat, name))
    }

    pub fn get_room(&self, room_id: RoomId) -> Result<&Room, EventError> {
        self.rooms.get(&room_id).ok_or(EventError::NotFound)
    }

    pub fn get_room_mut(&mut self, room_id: RoomId) -> Result<&mut Room, EventError> {
        self.rooms.get_mut(&room_id).ok_or(EventError::NotFound)
    }

    /// Tear down a room, evicting every remaining seat. Returns the
    /// evicted connection ids (their registry entries stay alive so the
    /// transport can still reach them).
    pub fn remove_room(&mut self, room_id: RoomId) -> Vec<ConnectionId> {
        let Some(room) = self.rooms.remove(&room_id) else {
            return Vec::new();
        };
        let evicted: Vec<ConnectionId> = room.seats().map(|(_, s)| s.connection).collect();
        for &conn in &evicted {
            self.registry.clear_assignment(conn);
        }
        if self.latest_room == Some(room_id) {
            self.latest_room = None;
        }
        self.pending_snapshots
            .retain(|_, requester| !evicted.contains(requester));
        evicted
    }

    /// Drop a connection and apply the configured disconnect policy to
    /// its room.
    pub fn unregister(&mut self, conn: ConnectionId) -> DisconnectOutcome {
        let info = self.registry.unregister(conn);
        self.pending_snapshots.retain(|_, r| *r != conn);
        let Some((room_id, seat)) = info.and_then(|i| i.assignment) else {
            return DisconnectOutcome::NotSeated;
        };

        match self.disconnect_policy {
            DisconnectPolicy::Teardown => {
                let mut evicted = self.remove_room(room_id);
                evicted.retain(|&c| c != conn);
                DisconnectOutcome::RoomTornDown { room_id, evicted }
            },
            DisconnectPolicy::VacateSeat => {
                let Some(room) = self.rooms.get_mut(&room_id) else {
                    return DisconnectOutcome::NotSeated;
                };
                room.vacate(seat);
                if room.phase == Phase::Active {
                    // A short-handed game cannot continue
                    room.phase = Phase::Lobby;
                    room.word = None;
                    room.clear_drawers();
                }
                let room_emptied = room.occupied() == 0;
                if room_emptied {
                    self.rooms.remove(&room_id);
                    if self.latest_room == Some(room_id) {
                        self.latest_room = None;
                    }
                }
                DisconnectOutcome::SeatVacated {
                    room_id,
                    seat,
                    room_emptied,
                }
            },
        }
    }

    /// Record a pending snapshot handoff. Each request carries its own
    /// correlation token, so overlapping handoffs cannot misroute.
    pub fn record_pending_snapshot(&mut self, token: Uuid, requester: ConnectionId) {
        self.pending_snapshots.insert(token, requester);
    }

    /// Claim a pending snapshot handoff by token.
    pub fn take_pending_snapshot(&mut self, token: Uuid) -> Option<ConnectionId> {
        self.pending_snapshots.remove(&token)
    }

    /// Private delivery to one connection.
    pub fn send_to_connection(&self, conn: ConnectionId, msg: &ServerMessage) {
        let Some(sender) = self.registry.sender(conn) else {
            tracing::debug!(connection = conn, "No sender for connection");
            return;
        };
        match encode_server_message(msg) {
            Ok(data) => {
                if let Err(e) = sender.try_send(Bytes::from(data)) {
                    tracing::debug!(
                        connection = conn, error = %e,
                        "Dropping message to slow or closed connection"
                    );
                }
            },
            Err(e) => tracing::warn!(error = %e, "Failed to encode server message"),
        }
    }

    /// Deliver to every seat in a room, including the sender.
    pub fn broadcast_to_room(&self, room_id: RoomId, msg: &ServerMessage) {
        self.broadcast_filtered(room_id, msg, None);
    }

    /// Deliver to every seat in a room except one connection.
    pub fn broadcast_to_room_except(
        &self,
        room_id: RoomId,
        except: ConnectionId,
        msg: &ServerMessage,
    ) {
        self.broadcast_filtered(room_id, msg, Some(except));
    }

    fn broadcast_filtered(&self, room_id: RoomId, msg: &ServerMessage, except: Option<ConnectionId>) {
        let Some(room) = self.rooms.get(&room_id) else {
            return;
        };
        let data = match encode_server_message(msg) {
            Ok(d) => Bytes::from(d),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode broadcast");
                return;
            },
        };
        for (_, seat) in room.seats() {
            if except == Some(seat.connection) {
                continue;
            }
            if let Some(sender) = self.registry.sender(seat.connection)
                && sender.try_send(data.clone()).is_err()
            {
                tracing::debug!(
                    connection = seat.connection,
                    room = room_id,
                    "Skipping broadcast to slow client"
                );
            }
        }
    }

    /// (active rooms, seated connections) for the health endpoint.
    pub fn stats(&self) -> (usize, usize) {
        let seated = self.rooms.values().map(|r| r.occupied()).sum();
        (self.rooms.len(), seated)
    }

    #[cfg(test)]
    pub fn room_exists(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }

    #[cfg(test)]
    pub fn pending_snapshot_count(&self) -> usize {
        self.pending_snapshots.len()
    }
}
