use serde::{Deserialize, Serialize};

/// A point on the shared canvas, in client pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One incremental line-segment drawing instruction.
///
/// Only the latest update per seat is retained server-side; there is no
/// stroke history. The owning seat is the map key under which the update
/// is stored, not a field of the update itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeUpdate {
    pub from: Point,
    pub to: Point,
    pub width: f32,
    pub color: String,
    /// Logical timestamp assigned by the drawing client. Updates that do
    /// not strictly advance this value are discarded, which keeps the
    /// stored per-seat state in timestamp order regardless of physical
    /// arrival order.
    pub last_update: u64,
}

impl StrokeUpdate {
    /// True when `self` would supersede `other` under the staleness rule.
    pub fn is_newer_than(&self, other: &StrokeUpdate) -> bool {
        self.last_update > other.last_update
    }
}
