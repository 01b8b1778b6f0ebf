#![forbid(unsafe_code)]

//! The engine facade: gesture lifecycle around plan, shadow-apply,
//! validate, and commit.
//!
//! # State Machine
//!
//! ```text
//! gesture:      None --on_drag_start--> Some(active) --on_drag_end--> None
//! per update:   Idle -> Proposing -> { Committed | Rejected } -> Idle
//! ```
//!
//! Each [`on_drag_over`](TableDrag::on_drag_over) call runs to completion:
//! the planner builds an edit list from the gesture anchor, a
//! [`Transaction`] applies it to a shadow copy, the validation chain judges
//! the shadow, and only an accepted proposal is replayed onto the
//! authoritative sequence. Listeners hear about commits only.
//!
//! # Invariants
//!
//! 1. The authoritative sequence is only ever observed in a state the
//!    chain accepted (or the initial state).
//! 2. A rejected proposal leaves ids, weights, and depths untouched.
//! 3. At most one gesture is active; a second start is an error.
//! 4. Ending a gesture never rolls back earlier commits made during it.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tabledrag_core::{RowId, SensorHit};

use crate::config::EngineConfig;
use crate::node::Node;
use crate::planner::{GestureAnchor, MovePlanner};
use crate::sequence::{Sequence, SequenceError};
use crate::source::{ConstructionError, RowConnector, RowSpec, build_sequence, parse_rows};
use crate::transaction::{EditError, Transaction, TransactionPhase};
use crate::validate::{ValidationChain, Validator, Verdict, Veto};

/// Errors surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Sequence(SequenceError),
    Edit(EditError),
    GestureInProgress { active: RowId },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence(err) => write!(f, "{err}"),
            Self::Edit(err) => write!(f, "{err}"),
            Self::GestureInProgress { active } => {
                write!(f, "a drag of row {active} is already in progress")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sequence(err) => Some(err),
            Self::Edit(err) => Some(err),
            Self::GestureInProgress { .. } => None,
        }
    }
}

impl From<SequenceError> for EngineError {
    fn from(err: SequenceError) -> Self {
        Self::Sequence(err)
    }
}

impl From<EditError> for EngineError {
    fn from(err: EditError) -> Self {
        Self::Edit(err)
    }
}

/// Result of one pointer update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DragOverOutcome {
    /// The proposal was accepted and is now authoritative.
    Committed {
        transaction_id: u64,
        indent_delta: i64,
    },
    /// At least one validator vetoed; nothing changed.
    Rejected {
        transaction_id: u64,
        indent_delta: i64,
        vetoes: Vec<Veto>,
    },
    /// The proposal equals the current sequence; nothing to validate.
    Unchanged { indent_delta: i64 },
    /// No gesture is active.
    NoActiveGesture,
}

impl DragOverOutcome {
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// The gesture currently owning the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveGesture {
    pub anchor: GestureAnchor,
    pub commits: u32,
    pub rejections: u32,
    #[serde(skip)]
    start_hash: u64,
}

/// What a finished gesture did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GestureSummary {
    pub dragged: RowId,
    pub commits: u32,
    pub rejections: u32,
    /// Whether the sequence differs from its state at drag start.
    pub moved: bool,
    pub canceled: bool,
}

/// Handle for removing a change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type ChangeListener = Box<dyn FnMut(&Sequence)>;

/// Hierarchical drag reorder-and-validate engine.
pub struct TableDrag {
    sequence: Sequence,
    planner: MovePlanner,
    chain: ValidationChain,
    gesture: Option<ActiveGesture>,
    phase: TransactionPhase,
    next_transaction_id: u64,
    next_listener_id: u64,
    listeners: Vec<(ListenerId, ChangeListener)>,
}

impl fmt::Debug for TableDrag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableDrag")
            .field("sequence", &self.sequence)
            .field("planner", &self.planner)
            .field("chain", &self.chain.names())
            .field("gesture", &self.gesture)
            .field("phase", &self.phase)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TableDrag {
    /// Build from row specs and configuration.
    pub fn new(rows: Vec<RowSpec>, config: &EngineConfig) -> Result<Self, ConstructionError> {
        Self::with_validators(rows, config, Vec::new())
    }

    /// Build with caller validators appended after the configured ones.
    pub fn with_validators(
        rows: Vec<RowSpec>,
        config: &EngineConfig,
        extra: Vec<Box<dyn Validator>>,
    ) -> Result<Self, ConstructionError> {
        let mut chain = config.build_chain()?;
        chain.extend(extra);
        let sequence = build_sequence(rows)?;
        tracing::debug!(
            rows = sequence.len(),
            validators = ?chain.names(),
            nesting_drag_distance = config.nesting_drag_distance,
            "engine attached"
        );
        Ok(Self {
            sequence,
            planner: MovePlanner::new(config.nesting_drag_distance),
            chain,
            gesture: None,
            phase: TransactionPhase::Idle,
            next_transaction_id: 1,
            next_listener_id: 1,
            listeners: Vec::new(),
        })
    }

    /// Build from host attribute maps through `connector`.
    pub fn from_attributes<C: RowConnector + ?Sized>(
        connector: &C,
        rows: &[BTreeMap<String, String>],
        config: &EngineConfig,
    ) -> Result<Self, ConstructionError> {
        Self::new(parse_rows(connector, rows)?, config)
    }

    /// Authoritative sequence.
    #[must_use]
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        self.sequence.nodes()
    }

    /// Phase reached by the most recent update.
    #[must_use]
    pub const fn phase(&self) -> TransactionPhase {
        self.phase
    }

    #[must_use]
    pub fn active_gesture(&self) -> Option<&ActiveGesture> {
        self.gesture.as_ref()
    }

    #[must_use]
    pub fn planner(&self) -> &MovePlanner {
        &self.planner
    }

    #[must_use]
    pub fn chain(&self) -> &ValidationChain {
        &self.chain
    }

    /// Run the chain against the authoritative sequence without changing it.
    #[must_use]
    pub fn validate_current(&self) -> Verdict {
        self.chain.evaluate(&self.sequence)
    }

    /// Register a listener called with every committed sequence.
    pub fn on_change(&mut self, listener: impl FnMut(&Sequence) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Begin a gesture on `id`, anchoring its subtree and pointer x.
    pub fn on_drag_start(
        &mut self,
        id: &RowId,
        pointer_x: i32,
    ) -> Result<GestureAnchor, EngineError> {
        if let Some(active) = &self.gesture {
            return Err(EngineError::GestureInProgress {
                active: active.anchor.dragged().clone(),
            });
        }
        let anchor = GestureAnchor::capture(&self.sequence, id, pointer_x)?;
        tracing::debug!(
            row = %id,
            start_depth = anchor.start_depth(),
            children = anchor.children().len(),
            pointer_x,
            "gesture started"
        );
        self.gesture = Some(ActiveGesture {
            anchor: anchor.clone(),
            commits: 0,
            rejections: 0,
            start_hash: self.sequence.state_hash(),
        });
        self.phase = TransactionPhase::Idle;
        Ok(anchor)
    }

    /// Plan, validate and maybe commit for the current pointer position.
    pub fn on_drag_over(
        &mut self,
        pointer_x: i32,
        pointer_y: i32,
        hit: &SensorHit,
    ) -> Result<DragOverOutcome, EngineError> {
        let Some(gesture) = self.gesture.as_mut() else {
            return Ok(DragOverOutcome::NoActiveGesture);
        };

        let plan = self
            .planner
            .plan(&self.sequence, &gesture.anchor, pointer_x, hit);
        let indent_delta = plan.indent_delta;
        let span = tracing::debug_span!(
            "tabledrag.drag_over",
            row = %gesture.anchor.dragged(),
            pointer_x,
            pointer_y,
            indent_delta,
            edit_count = plan.edits.len(),
        );
        let _guard = span.enter();

        let transaction_id = self.next_transaction_id;
        self.next_transaction_id += 1;
        self.phase = TransactionPhase::Proposing;

        let mut transaction = Transaction::begin(transaction_id, &self.sequence);
        if let Err(err) = transaction.apply_all(plan.edits) {
            self.phase = TransactionPhase::Idle;
            return Err(err.into());
        }

        if transaction.is_noop() {
            let _ = transaction.rollback();
            self.phase = TransactionPhase::Idle;
            tracing::trace!(transaction_id, "proposal unchanged");
            return Ok(DragOverOutcome::Unchanged { indent_delta });
        }

        let verdict = transaction.validate(&self.chain);
        if !verdict.is_accepted() {
            let _ = transaction.rollback();
            gesture.rejections += 1;
            self.phase = TransactionPhase::Rejected;
            for veto in verdict.vetoes() {
                tracing::trace!(
                    validator = veto.validator,
                    row = veto.node.as_ref().map(RowId::as_str),
                    reason = veto.reason.as_str(),
                    "veto"
                );
            }
            tracing::debug!(
                transaction_id,
                vetoes = verdict.vetoes().len(),
                "transition rejected"
            );
            return Ok(DragOverOutcome::Rejected {
                transaction_id,
                indent_delta,
                vetoes: verdict.into_vetoes(),
            });
        }

        let outcome = transaction.commit(&mut self.sequence);
        if let Err(err) = outcome {
            self.phase = TransactionPhase::Idle;
            return Err(err.into());
        }
        gesture.commits += 1;
        self.phase = TransactionPhase::Committed;
        tracing::debug!(
            transaction_id,
            state_hash = self.sequence.state_hash(),
            "transition committed"
        );
        for (_, listener) in &mut self.listeners {
            listener(&self.sequence);
        }
        Ok(DragOverOutcome::Committed {
            transaction_id,
            indent_delta,
        })
    }

    /// Finish the gesture. Committed changes stay.
    pub fn on_drag_end(&mut self) -> Option<GestureSummary> {
        self.finish(false)
    }

    /// Abort the gesture. The sequence stays as the last commit left it.
    pub fn on_drag_cancel(&mut self) -> Option<GestureSummary> {
        self.finish(true)
    }

    fn finish(&mut self, canceled: bool) -> Option<GestureSummary> {
        let gesture = self.gesture.take()?;
        self.phase = TransactionPhase::Idle;
        let summary = GestureSummary {
            dragged: gesture.anchor.dragged().clone(),
            commits: gesture.commits,
            rejections: gesture.rejections,
            moved: self.sequence.state_hash() != gesture.start_hash,
            canceled,
        };
        tracing::debug!(
            row = %summary.dragged,
            commits = summary.commits,
            rejections = summary.rejections,
            moved = summary.moved,
            canceled,
            "gesture ended"
        );
        Some(summary)
    }
}
