use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connections: ConnectionCounts,
    pub rooms: RoomCounts,
}

#[derive(Serialize)]
pub struct ConnectionCounts {
    pub websocket: usize,
}

#[derive(Serialize)]
pub struct RoomCounts {
    pub active: usize,
    pub seated: usize,
}

/// Structured health check endpoint. Returns server status, connection
/// counts, and room info as JSON.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ws = state.ws_connection_count.load(Ordering::Relaxed);

    let (active_rooms, seated) = {
        let rooms = state.rooms.read().await;
        rooms.stats()
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        connections: ConnectionCounts { websocket: ws },
        rooms: RoomCounts {
            active: active_rooms,
            seated,
        },
    })
}
