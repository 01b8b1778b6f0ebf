#![forbid(unsafe_code)]

//! Pointer geometry in host pixels.

use serde::{Deserialize, Serialize};

/// A pointer location in host coordinates (pixels, y grows downward).
///
/// Signed so that pointers dragged past the top or left edge of the list
/// keep a meaningful displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position.
    #[must_use]
    pub fn manhattan_distance(self, other: Self) -> u64 {
        u64::from((i64::from(self.x) - i64::from(other.x)).unsigned_abs())
            + u64::from((i64::from(self.y) - i64::from(other.y)).unsigned_abs())
    }

    /// Displacement `(dx, dy)` from `origin` to `self`.
    #[must_use]
    pub fn delta_from(self, origin: Self) -> (i64, i64) {
        (
            i64::from(self.x) - i64::from(origin.x),
            i64::from(self.y) - i64::from(origin.y),
        )
    }
}

impl From<(i32, i32)> for PointerPosition {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}
