#![forbid(unsafe_code)]

//! Canonical pointer input events.
//!
//! Hosts translate whatever their platform delivers (mouse, touch, pen) into
//! [`PointerEvent`] values before feeding the [`DragRecognizer`].
//!
//! [`DragRecognizer`]: crate::gesture::DragRecognizer

use serde::{Deserialize, Serialize};

use crate::geometry::PointerPosition;

/// What happened to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    /// Button pressed / finger down.
    Down,
    /// Pointer moved (with or without a pressed button).
    Move,
    /// Button released / finger lifted.
    Up,
    /// The platform aborted the interaction (focus loss, Escape, capture lost).
    Cancel,
}

/// One pointer input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Platform pointer identifier; distinguishes concurrent pointers.
    #[serde(default)]
    pub pointer_id: u32,
    pub kind: PointerEventKind,
    pub position: PointerPosition,
}

impl PointerEvent {
    #[must_use]
    pub const fn new(pointer_id: u32, kind: PointerEventKind, position: PointerPosition) -> Self {
        Self {
            pointer_id,
            kind,
            position,
        }
    }

    /// Primary-pointer press at `(x, y)`.
    #[must_use]
    pub const fn down(x: i32, y: i32) -> Self {
        Self::new(0, PointerEventKind::Down, PointerPosition::new(x, y))
    }

    /// Primary-pointer move to `(x, y)`.
    #[must_use]
    pub const fn moved(x: i32, y: i32) -> Self {
        Self::new(0, PointerEventKind::Move, PointerPosition::new(x, y))
    }

    /// Primary-pointer release at `(x, y)`.
    #[must_use]
    pub const fn up(x: i32, y: i32) -> Self {
        Self::new(0, PointerEventKind::Up, PointerPosition::new(x, y))
    }

    /// Primary-pointer cancellation.
    #[must_use]
    pub const fn cancel() -> Self {
        Self::new(0, PointerEventKind::Cancel, PointerPosition::new(0, 0))
    }

    /// Same event attributed to a different pointer.
    #[must_use]
    pub const fn with_pointer(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_is_stable() {
        let event = PointerEvent::moved(12, -4).with_pointer(2);
        let json = serde_json::to_value(event).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "pointer_id": 2,
                "kind": "move",
                "position": { "x": 12, "y": -4 }
            })
        );
    }

    #[test]
    fn pointer_id_defaults_to_primary() {
        let event: PointerEvent =
            serde_json::from_str(r#"{"kind":"down","position":{"x":1,"y":2}}"#)
                .expect("deserialize");
        assert_eq!(event, PointerEvent::down(1, 2));
    }
}
