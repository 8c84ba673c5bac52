/// Why an inbound client event was dropped.
///
/// All of these are handled locally by discarding the single offending
/// event; none is fatal to the connection, the room, or the process,
/// and no rejection is surfaced to the offending client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventError {
    /// The connection or room no longer exists. Occurs legitimately for
    /// late or duplicate events arriving after a room teardown.
    NotFound,
    /// A gated action was attempted by the wrong seat for the current
    /// phase (non-drawer drawing, drawer chatting, and so on).
    PermissionDenied,
    /// Malformed event data; fails the event, not the connection.
    InvalidPayload,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "connection or room not found"),
            Self::PermissionDenied => write!(f, "action not permitted for this seat"),
            Self::InvalidPayload => write!(f, "malformed event payload"),
        }
    }
}

impl std::error::Error for EventError {}
