//! Game-state transitions: joining, round start, guess evaluation,
//! drawer rotation, win handling, and disconnects.
//!
//! Every function here runs under the room manager's write lock and
//! expresses its effects through the manager's broadcast primitives.
//! Failures are signalled with [`EventError`] and dropped by the caller;
//! nothing in this module can take the server down.

use rand::Rng;

use scrawl_core::net::messages::{JoinMsg, RoomAssignedMsg, ScoreMsg, ServerMessage};
use scrawl_core::room::{ConnectionId, Phase, RoomId, SeatIndex, WIN_THRESHOLD};
use scrawl_core::words;

use crate::error::EventError;
use crate::relay;
use crate::room_manager::{DisconnectOutcome, RoomManager, SeatAssignment};

const MAX_NAME_LEN: usize = 32;

/// Seat a named connection, announce the arrival, and start the game
/// once the room fills.
pub fn handle_join(
    mgr: &mut RoomManager,
    conn: ConnectionId,
    join: JoinMsg,
) -> Result<SeatAssignment, EventError> {
    let name = join.name.trim().to_string();
    if name.is_empty() || name.len() > MAX_NAME_LEN || name.chars().any(char::is_control) {
        return Err(EventError::InvalidPayload);
    }

    let assignment = mgr.identify(conn, name.clone(), join.stroke)?;
    let SeatAssignment {
        room_id,
        seat,
        newly_seated,
    } = assignment;

    mgr.send_to_connection(
        conn,
        &ServerMessage::RoomAssigned(RoomAssignedMsg { room_id, seat }),
    );
    if !newly_seated {
        // Duplicate join: just restate the assignment
        return Ok(assignment);
    }

    mgr.send_to_connection(conn, &ServerMessage::server_chat("You joined the room"));
    mgr.broadcast_to_room_except(
        room_id,
        conn,
        &ServerMessage::server_chat(format!("{name} has joined the room.")),
    );

    // Mid-lobby joiners catch up from seat 0's canvas; the fourth joiner
    // starts on a freshly cleared one.
    if seat == 1 || seat == 2 {
        relay::request_snapshot(mgr, room_id, conn);
    }

    if mgr.get_room(room_id)?.is_full() {
        start_game(mgr, room_id);
    }
    Ok(assignment)
}

/// Transition a full lobby into an active round: reset the canvas, show
/// the scoreboard, and pick the first drawer and word uniformly at random.
fn start_game(mgr: &mut RoomManager, room_id: RoomId) {
    mgr.broadcast_to_room(room_id, &ServerMessage::ClearCanvas);
    mgr.broadcast_to_room(room_id, &ServerMessage::server_chat("Ready to start the game"));

    let Ok(room) = mgr.get_room(room_id) else {
        return;
    };
    let scores: Vec<ScoreMsg> = room
        .seats()
        .map(|(_, s)| ScoreMsg {
            name: s.name.clone(),
            score: s.score,
        })
        .collect();
    let occupied: Vec<SeatIndex> = room.seats().map(|(i, _)| i).collect();
    if occupied.is_empty() {
        return;
    }
    for score in &scores {
        mgr.broadcast_to_room(room_id, &ServerMessage::ScoreDisplay(score.clone()));
    }

    let mut rng = rand::rng();
    let drawer = occupied[rng.random_range(0..occupied.len())];
    let word = words::random_word();

    let Ok(room) = mgr.get_room_mut(room_id) else {
        return;
    };
    room.phase = Phase::Active;
    room.word = Some(word);
    let Some(seat) = room.seat_mut(drawer) else {
        return;
    };
    seat.is_drawer = true;
    let drawer_conn = seat.connection;
    let drawer_name = seat.name.clone();

    mgr.broadcast_to_room(
        room_id,
        &ServerMessage::server_chat(format!("{drawer_name} is the drawer!")),
    );
    mgr.send_to_connection(
        drawer_conn,
        &ServerMessage::server_chat(format!("You are the drawer! Your word is {word}")),
    );
}

/// Relay a chat line, evaluating it as a guess while a round is active.
///
/// The drawer's chat is suppressed entirely during a round so the word
/// cannot leak. Matching is exact and case-sensitive.
pub fn handle_chat(mgr: &mut RoomManager, conn: ConnectionId, content: String) -> Result<(), EventError> {
    let (room_id, seat_idx, name) = mgr.lookup(conn)?;
    let room = mgr.get_room(room_id)?;

    let matched = match room.phase {
        Phase::Lobby => false,
        Phase::Active => {
            let seat = room.seat(seat_idx).ok_or(EventError::NotFound)?;
            if seat.is_drawer {
                return Err(EventError::PermissionDenied);
            }
            room.word.is_some_and(|w| w == content)
        },
    };

    mgr.broadcast_to_room(
        room_id,
        &ServerMessage::Chat(scrawl_core::net::messages::ServerChatMsg {
            from: name.clone(),
            content: content.clone(),
        }),
    );
    if matched {
        handle_word_match(mgr, room_id, seat_idx, conn, &name);
    }
    Ok(())
}

/// A guesser found the word: award the point, check for a win, and
/// rotate the drawer role to the guesser with a fresh word.
fn handle_word_match(
    mgr: &mut RoomManager,
    room_id: RoomId,
    guesser: SeatIndex,
    conn: ConnectionId,
    name: &str,
) {
    mgr.broadcast_to_room(
        room_id,
        &ServerMessage::server_chat(format!("{name} guessed correctly")),
    );

    let Ok(room) = mgr.get_room_mut(room_id) else {
        return;
    };
    let Some(seat) = room.seat_mut(guesser) else {
        return;
    };
    seat.score += 1;
    let new_score = seat.score;
    mgr.broadcast_to_room(
        room_id,
        &ServerMessage::ScoreUpdate(ScoreMsg {
            name: name.to_string(),
            score: new_score,
        }),
    );

    if new_score >= WIN_THRESHOLD {
        handle_win(mgr, room_id, conn, name);
    }

    // The guesser draws next, win or not
    let word = words::random_word();
    let Ok(room) = mgr.get_room_mut(room_id) else {
        return;
    };
    room.clear_drawers();
    room.word = Some(word);
    let Some(seat) = room.seat_mut(guesser) else {
        return;
    };
    seat.is_drawer = true;

    mgr.broadcast_to_room(room_id, &ServerMessage::ClearCanvas);
    mgr.send_to_connection(
        conn,
        &ServerMessage::server_chat(format!("You are the drawer! Your word is {word}")),
    );
    mgr.broadcast_to_room_except(
        room_id,
        conn,
        &ServerMessage::server_chat(format!("{name} is the drawer!")),
    );
}

/// Announce the winner and reset every score to zero in the same
/// transition, so no observer ever sees a stale winning score.
fn handle_win(mgr: &mut RoomManager, room_id: RoomId, winner_conn: ConnectionId, winner_name: &str) {
    mgr.broadcast_to_room(room_id, &ServerMessage::ClearChat);
    mgr.send_to_connection(
        winner_conn,
        &ServerMessage::server_chat("Congratulations! You Won!"),
    );
    mgr.broadcast_to_room_except(
        room_id,
        winner_conn,
        &ServerMessage::server_chat(format!("{winner_name} is the Winner!")),
    );

    let Ok(room) = mgr.get_room_mut(room_id) else {
        return;
    };
    let mut resets = Vec::new();
    let indices: Vec<SeatIndex> = room.seats().map(|(i, _)| i).collect();
    for idx in indices {
        if let Some(seat) = room.seat_mut(idx) {
            seat.score = 0;
            resets.push(ScoreMsg {
                name: seat.name.clone(),
                score: 0,
            });
        }
    }
    for msg in resets {
        mgr.broadcast_to_room(room_id, &ServerMessage::ScoreUpdate(msg));
    }
}

/// Clear the room's canvas. During a round only the drawer may clear;
/// in the lobby anyone can.
pub fn handle_clear(mgr: &mut RoomManager, conn: ConnectionId) -> Result<(), EventError> {
    let (room_id, seat_idx, _name) = mgr.lookup(conn)?;
    let room = mgr.get_room(room_id)?;
    if room.phase == Phase::Active {
        let seat = room.seat(seat_idx).ok_or(EventError::NotFound)?;
        if !seat.is_drawer {
            return Err(EventError::PermissionDenied);
        }
    }
    mgr.broadcast_to_room(room_id, &ServerMessage::ClearCanvas);
    Ok(())
}

/// Announce the departure, then apply the configured disconnect policy.
pub fn handle_disconnect(mgr: &mut RoomManager, conn: ConnectionId) {
    let Ok((room_id, _seat, name)) = mgr.lookup(conn) else {
        // Never seated; nothing to announce
        mgr.unregister(conn);
        return;
    };
    mgr.broadcast_to_room_except(
        room_id,
        conn,
        &ServerMessage::server_chat(format!("{name} has left the room.")),
    );

    match mgr.unregister(conn) {
        DisconnectOutcome::RoomTornDown { evicted, .. } => {
            // The room entry is gone, so reach the evicted seats directly
            for other in evicted {
                mgr.send_to_connection(
                    other,
                    &ServerMessage::server_chat(
                        "A user has disconnected. Not enough players to continue.",
                    ),
                );
            }
            tracing::info!(room = room_id, "Room torn down after disconnect");
        },
        DisconnectOutcome::SeatVacated { room_emptied, .. } => {
            if !room_emptied {
                mgr.broadcast_to_room(
                    room_id,
                    &ServerMessage::server_chat("A player left. Waiting in the lobby for a replacement."),
                );
            }
            tracing::info!(room = room_id, "Seat vacated after disconnect");
        },
        DisconnectOutcome::NotSeated => {},
    }
}
