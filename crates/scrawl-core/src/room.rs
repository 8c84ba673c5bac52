use serde::{Deserialize, Serialize};

use crate::stroke::StrokeUpdate;

/// Unique identifier for a live connection.
pub type ConnectionId = u64;

/// Monotonically assigned room identifier.
pub type RoomId = u64;

/// Index of a seat within a room (`0..ROOM_CAPACITY`).
pub type SeatIndex = u8;

/// Every room holds exactly this many seats; the game starts when the
/// last one is filled.
pub const ROOM_CAPACITY: usize = 4;

/// Score at which a seat wins the game and all scores reset.
pub const WIN_THRESHOLD: u32 = 3;

/// Current phase of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Pre-game: seats still filling, drawing and chat unrestricted.
    Lobby,
    /// Game running: one drawer holds the secret word, everyone else guesses.
    Active,
}

/// A slot within a room, bound to one connection at a time.
#[derive(Debug, Clone)]
pub struct Seat {
    pub connection: ConnectionId,
    pub name: String,
    pub is_drawer: bool,
    pub score: u32,
    /// Latest stroke state reported by this seat, if any.
    pub stroke: Option<StrokeUpdate>,
}

impl Seat {
    pub fn new(connection: ConnectionId, name: String, stroke: Option<StrokeUpdate>) -> Self {
        Self {
            connection,
            name,
            is_drawer: false,
            score: 0,
            stroke,
        }
    }

    /// Store `update` as this seat's latest stroke state unless it is stale.
    /// Returns false (and leaves state untouched) when the update's logical
    /// timestamp does not strictly advance the stored one.
    pub fn apply_stroke(&mut self, update: StrokeUpdate) -> bool {
        if let Some(ref current) = self.stroke
            && !update.is_newer_than(current)
        {
            return false;
        }
        self.stroke = Some(update);
        true
    }
}

/// One isolated game instance.
///
/// Invariant: exactly one seat has `is_drawer == true` while the phase is
/// `Active`, and none while `Lobby`. A word is present iff `Active`.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub phase: Phase,
    pub word: Option<&'static str>,
    seats: Vec<Option<Seat>>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            phase: Phase::Lobby,
            word: None,
            seats: vec![None; ROOM_CAPACITY],
        }
    }

    /// Place `seat` into the lowest-numbered free slot. Returns the assigned
    /// index, or None when the room is full.
    pub fn occupy_next(&mut self, seat: Seat) -> Option<SeatIndex> {
        let idx = self.seats.iter().position(|s| s.is_none())?;
        self.seats[idx] = Some(seat);
        Some(idx as SeatIndex)
    }

    pub fn vacate(&mut self, index: SeatIndex) -> Option<Seat> {
        self.seats.get_mut(index as usize)?.take()
    }

    pub fn is_full(&self) -> bool {
        self.seats.iter().all(|s| s.is_some())
    }

    pub fn occupied(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    pub fn seat(&self, index: SeatIndex) -> Option<&Seat> {
        self.seats.get(index as usize)?.as_ref()
    }

    pub fn seat_mut(&mut self, index: SeatIndex) -> Option<&mut Seat> {
        self.seats.get_mut(index as usize)?.as_mut()
    }

    /// Iterate occupied seats in seat order.
    pub fn seats(&self) -> impl Iterator<Item = (SeatIndex, &Seat)> {
        self.seats
            .iter()
            .enumerate()
            .filter_map(|(i, s)| Some((i as SeatIndex, s.as_ref()?)))
    }

    /// Find the seat bound to a connection.
    pub fn seat_of(&self, connection: ConnectionId) -> Option<SeatIndex> {
        self.seats()
            .find(|(_, s)| s.connection == connection)
            .map(|(i, _)| i)
    }

    /// The seat currently marked as drawer, if any.
    pub fn drawer_index(&self) -> Option<SeatIndex> {
        self.seats().find(|(_, s)| s.is_drawer).map(|(i, _)| i)
    }

    /// Clear the drawer flag on every seat.
    pub fn clear_drawers(&mut self) {
        for seat in self.seats.iter_mut().flatten() {
            seat.is_drawer = false;
        }
    }
}
