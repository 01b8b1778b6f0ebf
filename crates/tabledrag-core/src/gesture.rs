#![forbid(unsafe_code)]

//! Drag recognition: turns raw pointer events into drag signals.
//!
//! [`DragRecognizer`] watches press → move → release sequences and emits
//! [`DragSignal`]s once the pointer has travelled far enough to count as a
//! drag rather than a click.
//!
//! # State Machine
//!
//! ```text
//! Idle -> Armed -> Dragging -> Idle
//!    \------> Idle (release/cancel while Armed: no signal)
//! ```
//!
//! # Invariants
//!
//! 1. A drag is well-formed: exactly one `Start`, zero or more `Move`, then
//!    exactly one of `End` or `Cancel`.
//! 2. Only the pointer that armed the recognizer can advance it. Events from
//!    other pointers are ignored until the active interaction finishes, so
//!    concurrent pointers never interleave two gestures.
//! 3. After [`reset`](DragRecognizer::reset) the recognizer is idle and emits
//!    nothing for the abandoned interaction.
//!
//! # Failure Modes
//!
//! - A `Move` without a prior `Down` is ignored (no implicit arming).
//! - A `Down` while another pointer is armed is ignored.

use serde::{Deserialize, Serialize};

use crate::event::{PointerEvent, PointerEventKind};
use crate::geometry::PointerPosition;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds for drag recognition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Minimum manhattan distance (pixels) before a drag starts (default: 3).
    pub drag_threshold: u16,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self { drag_threshold: 3 }
    }
}

impl GestureConfig {
    /// Create a config with custom threshold.
    #[must_use]
    pub fn with_threshold(mut self, pixels: u16) -> Self {
        self.drag_threshold = pixels;
        self
    }
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// High-level drag lifecycle signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum DragSignal {
    /// The pointer crossed the threshold; `origin` is where it was pressed.
    Start {
        pointer_id: u32,
        origin: PointerPosition,
    },
    /// The pointer moved while dragging.
    Move {
        origin: PointerPosition,
        current: PointerPosition,
        delta: (i64, i64),
    },
    /// The pointer was released after dragging.
    End {
        origin: PointerPosition,
        end: PointerPosition,
    },
    /// The drag was aborted.
    Cancel,
}

#[derive(Debug, Clone, Copy)]
struct DragTracker {
    pointer_id: u32,
    origin: PointerPosition,
    last: PointerPosition,
    started: bool,
}

// ---------------------------------------------------------------------------
// DragRecognizer
// ---------------------------------------------------------------------------

/// Stateful drag recognizer.
///
/// Call [`process`](DragRecognizer::process) for each incoming
/// [`PointerEvent`].
#[derive(Debug, Clone, Default)]
pub struct DragRecognizer {
    config: GestureConfig,
    tracker: Option<DragTracker>,
}

impl DragRecognizer {
    /// Create a new recognizer with the given configuration.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            tracker: None,
        }
    }

    /// Process a pointer event, returning the drag signals it produces.
    ///
    /// Most events produce zero or one signal. The move that crosses the
    /// threshold produces both `Start` and `Move`.
    pub fn process(&mut self, event: &PointerEvent) -> Vec<DragSignal> {
        let mut out = Vec::with_capacity(2);

        if let Some(tracker) = self.tracker
            && tracker.pointer_id != event.pointer_id
        {
            return out;
        }

        match event.kind {
            PointerEventKind::Down => {
                if self.tracker.is_none() {
                    self.tracker = Some(DragTracker {
                        pointer_id: event.pointer_id,
                        origin: event.position,
                        last: event.position,
                        started: false,
                    });
                }
            }
            PointerEventKind::Move => self.on_move(event.position, &mut out),
            PointerEventKind::Up => {
                if let Some(tracker) = self.tracker.take()
                    && tracker.started
                {
                    out.push(DragSignal::End {
                        origin: tracker.origin,
                        end: event.position,
                    });
                }
            }
            PointerEventKind::Cancel => {
                if let Some(tracker) = self.tracker.take()
                    && tracker.started
                {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(pointer_id = tracker.pointer_id, "drag canceled");
                    out.push(DragSignal::Cancel);
                }
            }
        }

        out
    }

    /// Whether a drag is currently in progress (threshold crossed).
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.tracker.is_some_and(|t| t.started)
    }

    /// Origin of the active drag, if one has started.
    #[must_use]
    pub fn origin(&self) -> Option<PointerPosition> {
        self.tracker.filter(|t| t.started).map(|t| t.origin)
    }

    /// Reset to idle without emitting anything.
    pub fn reset(&mut self) {
        self.tracker = None;
    }

    /// Get a reference to the current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Update the configuration.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    fn on_move(&mut self, position: PointerPosition, out: &mut Vec<DragSignal>) {
        let threshold = u64::from(self.config.drag_threshold);
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };

        if !tracker.started && tracker.origin.manhattan_distance(position) >= threshold {
            tracker.started = true;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                pointer_id = tracker.pointer_id,
                x = tracker.origin.x,
                y = tracker.origin.y,
                "drag started"
            );
            out.push(DragSignal::Start {
                pointer_id: tracker.pointer_id,
                origin: tracker.origin,
            });
        }

        if tracker.started {
            out.push(DragSignal::Move {
                origin: tracker.origin,
                current: position,
                delta: position.delta_from(tracker.last),
            });
        }

        tracker.last = position;
    }
}
