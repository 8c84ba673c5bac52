use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use scrawl_core::net::messages::ClientMessage;
use scrawl_core::net::protocol::{MAX_MESSAGE_SIZE, decode_client_message};
use scrawl_core::room::ConnectionId;

use crate::error::EventError;
use crate::state::{AppState, ConnectionGuard};
use crate::{game, relay};

pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, StatusCode> {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state))
        .into_response())
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let _guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));
    let (ws_sender, mut ws_receiver) = socket.split();

    // Wait for the first message: must be a Join.
    let first_msg = match ws_receiver.next().await {
        Some(Ok(Message::Binary(data))) => data,
        _ => return,
    };
    let Ok(ClientMessage::Join(join)) = decode_client_message(&first_msg) else {
        return;
    };

    let (tx, rx) = mpsc::channel::<Bytes>(state.config.limits.player_message_buffer);
    let conn_id = {
        let mut rooms = state.rooms.write().await;
        let conn_id = rooms.register(tx);
        match game::handle_join(&mut rooms, conn_id, join) {
            Ok(assignment) => {
                tracing::info!(
                    connection = conn_id,
                    room = assignment.room_id,
                    seat = assignment.seat,
                    "Player joined"
                );
            },
            Err(e) => {
                tracing::debug!(connection = conn_id, error = %e, "Join rejected");
                rooms.unregister(conn_id);
                return;
            },
        }
        conn_id
    };

    spawn_writer(ws_sender, rx);

    read_loop(&mut ws_receiver, &state, conn_id).await;

    // Connection closed — apply the disconnect policy
    let mut rooms = state.rooms.write().await;
    game::handle_disconnect(&mut rooms, conn_id);
    drop(rooms);

    tracing::info!(connection = conn_id, "Player disconnected");
}

fn spawn_writer(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Bytes>,
) {
    tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if ws_sender
                .send(Message::Binary(data.to_vec().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Returns true if the message is allowed; false if rate-limited.
    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

async fn read_loop(
    ws_receiver: &mut futures::stream::SplitStream<WebSocket>,
    state: &AppState,
    conn: ConnectionId,
) {
    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let data = match msg {
            Message::Binary(d) => d.to_vec(),
            Message::Close(_) => break,
            _ => continue,
        };

        // Rate limit: drop messages that exceed per-connection rate
        if !rate_limiter.allow() {
            tracing::warn!(connection = conn, "Rate limited");
            continue;
        }

        // Drop empty and oversized messages
        if data.is_empty() || data.len() > MAX_MESSAGE_SIZE {
            continue;
        }

        let client_msg = match decode_client_message(&data) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(connection = conn, error = %e, "Undecodable message");
                continue;
            },
        };

        let result = {
            let mut rooms = state.rooms.write().await;
            match client_msg {
                // Duplicate joins just restate the existing assignment
                ClientMessage::Join(join) => game::handle_join(&mut rooms, conn, join).map(|_| ()),
                ClientMessage::StrokeUpdate(m) => {
                    relay::handle_stroke(&mut rooms, conn, m.stroke).map(|_| ())
                },
                ClientMessage::ClearRequest => game::handle_clear(&mut rooms, conn),
                ClientMessage::Chat(m) => {
                    // Cap at 1024 chars, no control chars besides newline
                    if m.content.len() > 1024
                        || m.content.chars().any(|c| c.is_control() && c != '\n')
                    {
                        Err(EventError::InvalidPayload)
                    } else {
                        game::handle_chat(&mut rooms, conn, m.content)
                    }
                },
                ClientMessage::CanvasSnapshot(m) => relay::handle_snapshot(&mut rooms, conn, m),
            }
        };

        // All event failures are non-fatal: drop and keep reading
        if let Err(e) = result {
            tracing::debug!(connection = conn, error = %e, "Event dropped");
        }
    }
}
