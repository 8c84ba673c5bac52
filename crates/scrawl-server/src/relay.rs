//! Stroke fan-out and canvas-snapshot handoff.

use uuid::Uuid;

use scrawl_core::net::messages::{
    CanvasSnapshotMsg, ServerMessage, SnapshotDeliverMsg, SnapshotRequestMsg, StrokeBroadcastMsg,
};
use scrawl_core::room::{ConnectionId, Phase, RoomId};
use scrawl_core::stroke::StrokeUpdate;

use crate::error::EventError;
use crate::room_manager::RoomManager;

/// Apply a stroke to the sender's seat and fan it out to the room.
///
/// While a round is active only the drawer may draw. A stroke whose
/// logical timestamp is not strictly newer than the stored one is
/// silently discarded (`Ok(false)`), so late frames cannot overwrite
/// fresher state.
pub fn handle_stroke(
    mgr: &mut RoomManager,
    conn: ConnectionId,
    stroke: StrokeUpdate,
) -> Result<bool, EventError> {
    let (room_id, seat_idx, name) = mgr.lookup(conn)?;
    let room = mgr.get_room_mut(room_id)?;
    if room.phase == Phase::Active
        && !room.seat(seat_idx).ok_or(EventError::NotFound)?.is_drawer
    {
        return Err(EventError::PermissionDenied);
    }
    let seat = room.seat_mut(seat_idx).ok_or(EventError::NotFound)?;
    if !seat.apply_stroke(stroke.clone()) {
        return Ok(false);
    }
    mgr.broadcast_to_room(
        room_id,
        &ServerMessage::StrokeBroadcast(StrokeBroadcastMsg {
            name,
            seat: seat_idx,
            stroke,
        }),
    );
    Ok(true)
}

/// Ask seat 0 for its current canvas so `requester` can catch up.
///
/// Each request mints a fresh correlation token, so two overlapping
/// handoffs (second and third joiner in quick succession) deliver to
/// the right recipient.
pub fn request_snapshot(mgr: &mut RoomManager, room_id: RoomId, requester: ConnectionId) {
    let Ok(room) = mgr.get_room(room_id) else {
        return;
    };
    let Some(source) = room.seat(0).map(|s| s.connection) else {
        return;
    };
    if source == requester {
        return;
    }
    let token = Uuid::new_v4();
    mgr.record_pending_snapshot(token, requester);
    mgr.send_to_connection(
        source,
        &ServerMessage::SnapshotRequest(SnapshotRequestMsg { token }),
    );
    tracing::debug!(room = room_id, %token, "Requested canvas snapshot");
}

/// Route an uploaded canvas snapshot to the joiner who asked for it.
/// A snapshot with an unknown or already-claimed token is dropped.
pub fn handle_snapshot(
    mgr: &mut RoomManager,
    _conn: ConnectionId,
    snapshot: CanvasSnapshotMsg,
) -> Result<(), EventError> {
    let requester = mgr
        .take_pending_snapshot(snapshot.token)
        .ok_or(EventError::NotFound)?;
    mgr.send_to_connection(
        requester,
        &ServerMessage::SnapshotDeliver(SnapshotDeliverMsg {
            image: snapshot.image,
        }),
    );
    Ok(())
}
