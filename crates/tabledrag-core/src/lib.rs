#![forbid(unsafe_code)]

//! Core: row identity, pointer input, drag recognition, and row hit-testing.
//!
//! # Role in tabledrag
//! `tabledrag-core` is the input layer. It owns the pieces a host needs to
//! turn raw pointer activity over a displayed list into the three calls the
//! reorder engine understands (`on_drag_start`, `on_drag_over`,
//! `on_drag_end`).
//!
//! # Primary responsibilities
//! - **RowId**: opaque, stable identity shared by the engine and the host.
//! - **PointerEvent**: canonical pointer input (down, move, up, cancel).
//! - **DragRecognizer**: thresholded drag detection over pointer events.
//! - **PositionSensor**: "which row is the pointer touching" hit-testing,
//!   with [`RowStrip`](sensor::RowStrip) as a uniform-row reference.
//!
//! # How it fits in the system
//! The engine crate (`tabledrag`) consumes [`RowId`] and [`SensorHit`] values
//! and never sees raw pointer events. Hosts wire a recognizer and a sensor in
//! front of the engine; the harness binary shows one such wiring.

pub mod event;
pub mod geometry;
pub mod gesture;
pub mod id;
pub mod sensor;

pub use event::{PointerEvent, PointerEventKind};
pub use geometry::PointerPosition;
pub use gesture::{DragRecognizer, DragSignal, GestureConfig};
pub use id::RowId;
pub use sensor::{PositionSensor, RowStrip, RowStripConfig, SensorHit};
