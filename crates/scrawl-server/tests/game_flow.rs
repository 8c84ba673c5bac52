mod common;

use common::{
    TestServer, WsStream, ws_connect, ws_join, ws_read_until, ws_send_client_msg,
    ws_try_read_server_msg,
};

use scrawl_core::net::messages::{
    CanvasSnapshotMsg, ChatMsg, ClientMessage, ServerMessage, StrokeUpdateMsg,
};
use scrawl_core::stroke::{Point, StrokeUpdate};

fn stroke_at(ts: u64) -> StrokeUpdate {
    StrokeUpdate {
        from: Point { x: 1.0, y: 1.0 },
        to: Point { x: 50.0, y: 50.0 },
        width: 3.0,
        color: "#ff0000".to_string(),
        last_update: ts,
    }
}

fn chat_content(msg: &ServerMessage) -> Option<&str> {
    match msg {
        ServerMessage::Chat(c) => Some(c.content.as_str()),
        _ => None,
    }
}

async fn send_chat(stream: &mut WsStream, content: &str) {
    ws_send_client_msg(
        stream,
        &ClientMessage::Chat(ChatMsg {
            content: content.to_string(),
        }),
    )
    .await;
}

/// Fill a fresh room with four clients and wait for the round to start.
/// Returns the streams (indexed by seat), the drawer's seat, and the word.
async fn start_full_room(server: &TestServer) -> (Vec<WsStream>, usize, String) {
    let mut streams = Vec::new();
    for (i, name) in ["Alice", "Bob", "Carol", "Dave"].iter().enumerate() {
        let mut stream = ws_connect(&server.ws_url()).await;
        let assigned = ws_join(&mut stream, name).await;
        assert_eq!(assigned.seat as usize, i);
        streams.push(stream);
    }

    // Everyone sees the drawer announcement once the room fills
    for stream in &mut streams {
        ws_read_until(stream, |m| {
            chat_content(m).is_some_and(|c| c.ends_with("is the drawer!"))
        })
        .await;
    }

    // Only the drawer gets a private word after the announcement
    let mut drawer = None;
    let mut word = None;
    for (i, stream) in streams.iter_mut().enumerate() {
        if let Some(msg) = ws_try_read_server_msg(stream, 300).await {
            let w = chat_content(&msg)
                .and_then(|c| c.strip_prefix("You are the drawer! Your word is "))
                .unwrap_or_else(|| panic!("unexpected message for seat {i}: {msg:?}"));
            assert!(drawer.is_none(), "two private word messages");
            drawer = Some(i);
            word = Some(w.to_string());
        }
    }
    (streams, drawer.unwrap(), word.unwrap())
}

/// One guess round: `guesser` sends the word, everyone consumes the
/// rotation, and the guesser becomes the drawer with a fresh word.
async fn guess_round(streams: &mut [WsStream], guesser: usize, word: &str) -> String {
    send_chat(&mut streams[guesser], word).await;

    let mut new_word = None;
    for i in 0..streams.len() {
        if i == guesser {
            let msg = ws_read_until(&mut streams[i], |m| {
                chat_content(m).is_some_and(|c| c.starts_with("You are the drawer! Your word is "))
            })
            .await;
            new_word = chat_content(&msg)
                .and_then(|c| c.strip_prefix("You are the drawer! Your word is "))
                .map(str::to_string);
        } else {
            ws_read_until(&mut streams[i], |m| {
                chat_content(m).is_some_and(|c| c.ends_with("is the drawer!"))
            })
            .await;
        }
    }
    new_word.unwrap()
}

#[tokio::test]
async fn four_joins_start_a_round() {
    let server = TestServer::new().await;
    let (_streams, drawer, word) = start_full_room(&server).await;
    assert!(drawer < 4);
    assert!(!word.is_empty());
}

#[tokio::test]
async fn fifth_client_lands_in_a_new_room() {
    let server = TestServer::new().await;
    let (_streams, _, _) = start_full_room(&server).await;

    let mut fifth = ws_connect(&server.ws_url()).await;
    let assigned = ws_join(&mut fifth, "Eve").await;
    assert_eq!(assigned.room_id, 2);
    assert_eq!(assigned.seat, 0);
}

#[tokio::test]
async fn correct_guess_awards_point_and_rotates() {
    let server = TestServer::new().await;
    let (mut streams, drawer, word) = start_full_room(&server).await;
    let guesser = (drawer + 1) % 4;

    send_chat(&mut streams[guesser], &word).await;

    // Every client sees the relayed guess, the announcement, and the score
    for i in 0..4 {
        ws_read_until(&mut streams[i], |m| {
            chat_content(m).is_some_and(|c| c.ends_with("guessed correctly"))
        })
        .await;
        let update = ws_read_until(&mut streams[i], |m| {
            matches!(m, ServerMessage::ScoreUpdate(_))
        })
        .await;
        let ServerMessage::ScoreUpdate(s) = update else {
            unreachable!()
        };
        assert_eq!(s.score, 1);
        ws_read_until(&mut streams[i], |m| matches!(m, ServerMessage::ClearCanvas)).await;
    }

    // The guesser now holds the drawer role and a fresh private word
    let msg = ws_read_until(&mut streams[guesser], |m| {
        chat_content(m).is_some_and(|c| c.starts_with("You are the drawer!"))
    })
    .await;
    assert!(chat_content(&msg).is_some());
}

#[tokio::test]
async fn near_miss_is_chat_not_a_guess() {
    let server = TestServer::new().await;
    let (mut streams, drawer, word) = start_full_room(&server).await;
    let guesser = (drawer + 1) % 4;
    let spectator = (drawer + 2) % 4;

    let near_miss = word.to_uppercase();
    send_chat(&mut streams[guesser], &near_miss).await;

    // Relayed as ordinary chat
    ws_read_until(&mut streams[spectator], |m| {
        chat_content(m) == Some(near_miss.as_str())
    })
    .await;
    // No score, no rotation follows
    assert!(
        ws_try_read_server_msg(&mut streams[spectator], 300)
            .await
            .is_none()
    );
}

#[tokio::test]
async fn drawer_chat_never_reaches_the_room() {
    let server = TestServer::new().await;
    let (mut streams, drawer, word) = start_full_room(&server).await;
    let spectator = (drawer + 1) % 4;

    send_chat(&mut streams[drawer], &word).await;
    send_chat(&mut streams[drawer], "it rhymes with...").await;

    assert!(
        ws_try_read_server_msg(&mut streams[spectator], 300)
            .await
            .is_none()
    );
}

#[tokio::test]
async fn only_drawer_strokes_are_relayed_during_round() {
    let server = TestServer::new().await;
    let (mut streams, drawer, _word) = start_full_room(&server).await;
    let other = (drawer + 1) % 4;
    let spectator = (drawer + 2) % 4;

    ws_send_client_msg(
        &mut streams[other],
        &ClientMessage::StrokeUpdate(StrokeUpdateMsg {
            stroke: stroke_at(1),
        }),
    )
    .await;
    assert!(
        ws_try_read_server_msg(&mut streams[spectator], 300)
            .await
            .is_none()
    );

    ws_send_client_msg(
        &mut streams[drawer],
        &ClientMessage::StrokeUpdate(StrokeUpdateMsg {
            stroke: stroke_at(2),
        }),
    )
    .await;
    let msg = ws_read_until(&mut streams[spectator], |m| {
        matches!(m, ServerMessage::StrokeBroadcast(_))
    })
    .await;
    let ServerMessage::StrokeBroadcast(b) = msg else {
        unreachable!()
    };
    assert_eq!(b.seat as usize, drawer);
    assert_eq!(b.stroke.last_update, 2);
}

#[tokio::test]
async fn third_point_wins_and_play_continues() {
    let server = TestServer::new().await;
    let (mut streams, drawer, mut word) = start_full_room(&server).await;

    // Two fixed players trade guesses until one reaches three points
    let a = (drawer + 1) % 4;
    let b = (drawer + 2) % 4;
    let mut current_drawer = drawer;
    for _ in 0..4 {
        let guesser = if current_drawer == a { b } else { a };
        word = guess_round(&mut streams, guesser, &word).await;
        current_drawer = guesser;
    }

    // Fifth guess is the winning one
    let winner = if current_drawer == a { b } else { a };
    send_chat(&mut streams[winner], &word).await;

    for i in 0..4 {
        ws_read_until(&mut streams[i], |m| matches!(m, ServerMessage::ClearChat)).await;
    }
    ws_read_until(&mut streams[winner], |m| {
        chat_content(m) == Some("Congratulations! You Won!")
    })
    .await;
    let loser = if winner == a { b } else { a };
    let mut zero_resets = 0;
    ws_read_until(&mut streams[loser], |m| {
        if matches!(m, ServerMessage::ScoreUpdate(s) if s.score == 0) {
            zero_resets += 1;
        }
        chat_content(m).is_some_and(|c| c.ends_with("is the drawer!"))
    })
    .await;
    assert_eq!(zero_resets, 4, "every seat's score reset was published");

    // The winner draws the next round
    ws_read_until(&mut streams[winner], |m| {
        chat_content(m).is_some_and(|c| c.starts_with("You are the drawer!"))
    })
    .await;
}

#[tokio::test]
async fn snapshot_handoff_reaches_the_new_joiner() {
    let server = TestServer::new().await;
    let mut first = ws_connect(&server.ws_url()).await;
    ws_join(&mut first, "Alice").await;

    let mut second = ws_connect(&server.ws_url()).await;
    ws_join(&mut second, "Bob").await;

    // Seat 0 is asked for its canvas on behalf of the new joiner
    let msg = ws_read_until(&mut first, |m| {
        matches!(m, ServerMessage::SnapshotRequest(_))
    })
    .await;
    let ServerMessage::SnapshotRequest(req) = msg else {
        unreachable!()
    };
    ws_send_client_msg(
        &mut first,
        &ClientMessage::CanvasSnapshot(CanvasSnapshotMsg {
            token: req.token,
            image: vec![0xDE, 0xAD, 0xBE, 0xEF],
        }),
    )
    .await;

    let msg = ws_read_until(&mut second, |m| {
        matches!(m, ServerMessage::SnapshotDeliver(_))
    })
    .await;
    let ServerMessage::SnapshotDeliver(deliver) = msg else {
        unreachable!()
    };
    assert_eq!(deliver.image, vec![0xDE, 0xAD, 0xBE, 0xEF]);
}

#[tokio::test]
async fn disconnect_tears_down_the_room() {
    let server = TestServer::new().await;
    let (mut streams, _, _) = start_full_room(&server).await;

    // Dave hangs up mid-round
    let dave = streams.pop().unwrap();
    drop(dave);

    for stream in &mut streams {
        ws_read_until(stream, |m| {
            chat_content(m) == Some("Dave has left the room.")
        })
        .await;
        ws_read_until(stream, |m| {
            chat_content(m) == Some("A user has disconnected. Not enough players to continue.")
        })
        .await;
    }

    // Survivors are unseated: their events are dropped, not fatal
    send_chat(&mut streams[0], "anyone there?").await;
    assert!(ws_try_read_server_msg(&mut streams[1], 300).await.is_none());

    // The old room is gone; the next join opens a fresh one
    let mut next = ws_connect(&server.ws_url()).await;
    let assigned = ws_join(&mut next, "Eve").await;
    assert_eq!(assigned.room_id, 2);
    assert_eq!(assigned.seat, 0);
}

#[tokio::test]
async fn lobby_chat_and_clear_are_open_to_all() {
    let server = TestServer::new().await;
    let mut first = ws_connect(&server.ws_url()).await;
    ws_join(&mut first, "Alice").await;
    let mut second = ws_connect(&server.ws_url()).await;
    ws_join(&mut second, "Bob").await;

    send_chat(&mut second, "hello").await;
    let msg = ws_read_until(&mut first, |m| chat_content(m) == Some("hello")).await;
    let ServerMessage::Chat(c) = msg else {
        unreachable!()
    };
    assert_eq!(c.from, "Bob");

    ws_send_client_msg(&mut second, &ClientMessage::ClearRequest).await;
    ws_read_until(&mut first, |m| matches!(m, ServerMessage::ClearCanvas)).await;
}
