#![forbid(unsafe_code)]

//! Hierarchical reorder-and-validate engine for drag-sorted nested lists.
//!
//! A list is a flat [`Sequence`] of [`Node`]s whose order is the pre-order
//! traversal of an implicit tree: each node carries a `depth`, its parent is
//! the nearest preceding node one level up, and its subtree is the
//! contiguous run of deeper nodes right after it.
//!
//! [`TableDrag`] turns drag gestures into atomic structural transitions:
//!
//! 1. [`on_drag_start`](TableDrag::on_drag_start) anchors the dragged row,
//!    its subtree, and the starting pointer x.
//! 2. Each [`on_drag_over`](TableDrag::on_drag_over) plans edits
//!    ([`MovePlanner`]), applies them to a shadow copy ([`Transaction`]),
//!    runs the [`ValidationChain`], and replays accepted edits on the
//!    authoritative sequence.
//! 3. [`on_drag_end`](TableDrag::on_drag_end) drops the anchor.
//!
//! # Example
//!
//! ```
//! use tabledrag::{EngineConfig, RowSpec, TableDrag};
//! use tabledrag_core::{RowId, SensorHit};
//!
//! let rows = (1..=4)
//!     .map(|i| RowSpec::new().with_id(i.to_string()).with_depth(0))
//!     .collect();
//! let mut engine = TableDrag::new(rows, &EngineConfig::default())?;
//!
//! engine.on_drag_start(&RowId::from("3"), 0)?;
//! engine.on_drag_over(0, 0, &SensorHit::below("4"))?;
//! engine.on_drag_end();
//!
//! let order: Vec<&str> = engine.nodes().iter().map(|n| n.id().as_str()).collect();
//! assert_eq!(order, ["1", "2", "4", "3"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod engine;
pub mod node;
pub mod planner;
pub mod renumber;
pub mod sequence;
pub mod source;
pub mod transaction;
pub mod validate;

pub use config::{DEFAULT_MAX_DEPTH, DEFAULT_NESTING_DRAG_DISTANCE, EngineConfig, ValidatorConfig};
pub use engine::{
    ActiveGesture, DragOverOutcome, EngineError, GestureSummary, ListenerId, TableDrag,
};
pub use node::Node;
pub use planner::{CapturedChild, Edit, GestureAnchor, MovePlanner, Plan};
pub use renumber::{is_dense, renumber};
pub use sequence::{Sequence, SequenceError};
pub use source::{
    AttributesConnector, ConstructionError, DEFAULT_KIND_ATTRIBUTE, RowConnector, RowIdAllocator,
    RowSpec, build_sequence, parse_rows,
};
pub use transaction::{
    EditError, JournalEntry, JournalResult, Transaction, TransactionOutcome, TransactionPhase,
};
pub use validate::{
    MaxChildrenValidator, MaxDepthValidator, ShapeValidator, TypeNestingValidator,
    ValidationChain, Validator, Verdict, Veto,
};
