#![forbid(unsafe_code)]

//! Speculative apply, validate, then commit or discard.
//!
//! A [`Transaction`] clones the authoritative [`Sequence`] into a shadow
//! copy, applies edits to the shadow only, and journals every attempt. On
//! commit the identical edit list is replayed against the authoritative
//! sequence. On rollback the shadow is dropped and the authoritative
//! sequence is never touched.
//!
//! # Invariants
//!
//! 1. The shadow shares no state with the authoritative sequence.
//! 2. Commit is all-or-nothing: if a replay step fails, the authoritative
//!    sequence is restored to the transaction's base snapshot.
//! 3. After a successful commit the authoritative state hash equals the
//!    shadow's.

use std::fmt;

use serde::Serialize;

use crate::planner::Edit;
use crate::sequence::{Sequence, SequenceError};
use crate::validate::{ValidationChain, Verdict};

/// Coordinator state for one pointer update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionPhase {
    #[default]
    Idle,
    Proposing,
    Committed,
    Rejected,
}

/// Result of one journaled edit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JournalResult {
    Applied,
    Failed { reason: String },
}

/// One journal row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub transaction_id: u64,
    pub sequence: u64,
    pub edit: Edit,
    pub before_hash: u64,
    pub after_hash: u64,
    pub result: JournalResult,
}

/// An edit that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditError {
    pub transaction_id: u64,
    pub edit: Edit,
    pub reason: SequenceError,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transaction {}: {} edit failed: {}",
            self.transaction_id,
            self.edit.kind(),
            self.reason
        )
    }
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

/// Finalized transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub transaction_id: u64,
    pub committed: bool,
    pub journal: Vec<JournalEntry>,
}

/// Shadow-copy transaction over a [`Sequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    transaction_id: u64,
    next_sequence: u64,
    base: Sequence,
    shadow: Sequence,
    edits: Vec<Edit>,
    journal: Vec<JournalEntry>,
}

impl Transaction {
    /// Snapshot `authoritative` into a fresh shadow copy.
    #[must_use]
    pub fn begin(transaction_id: u64, authoritative: &Sequence) -> Self {
        Self {
            transaction_id,
            next_sequence: 1,
            base: authoritative.clone(),
            shadow: authoritative.clone(),
            edits: Vec::new(),
            journal: Vec::new(),
        }
    }

    #[must_use]
    pub const fn transaction_id(&self) -> u64 {
        self.transaction_id
    }

    /// The proposal as edited so far.
    #[must_use]
    pub fn shadow(&self) -> &Sequence {
        &self.shadow
    }

    /// Authoritative state when the transaction began.
    #[must_use]
    pub fn base(&self) -> &Sequence {
        &self.base
    }

    /// Successfully applied edits, in order.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    #[must_use]
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    /// Whether the shadow is structurally identical to the base.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.shadow == self.base
    }

    /// Apply one edit to the shadow. Every attempt is journaled.
    pub fn apply(&mut self, edit: Edit) -> Result<(), EditError> {
        let before_hash = self.shadow.state_hash();
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);

        match edit.apply(&mut self.shadow) {
            Ok(()) => {
                self.journal.push(JournalEntry {
                    transaction_id: self.transaction_id,
                    sequence,
                    edit: edit.clone(),
                    before_hash,
                    after_hash: self.shadow.state_hash(),
                    result: JournalResult::Applied,
                });
                self.edits.push(edit);
                Ok(())
            }
            Err(reason) => {
                self.journal.push(JournalEntry {
                    transaction_id: self.transaction_id,
                    sequence,
                    edit: edit.clone(),
                    before_hash,
                    after_hash: before_hash,
                    result: JournalResult::Failed {
                        reason: reason.to_string(),
                    },
                });
                Err(EditError {
                    transaction_id: self.transaction_id,
                    edit,
                    reason,
                })
            }
        }
    }

    /// Apply edits in order, stopping at the first failure.
    pub fn apply_all(&mut self, edits: impl IntoIterator<Item = Edit>) -> Result<(), EditError> {
        edits.into_iter().try_for_each(|edit| self.apply(edit))
    }

    /// Run `chain` against the shadow.
    #[must_use]
    pub fn validate(&self, chain: &ValidationChain) -> Verdict {
        chain.evaluate(&self.shadow)
    }

    /// Replay the applied edits against `authoritative`.
    ///
    /// `authoritative` must be the sequence the transaction began from. On
    /// failure it is restored to that snapshot.
    pub fn commit(self, authoritative: &mut Sequence) -> Result<TransactionOutcome, EditError> {
        for edit in &self.edits {
            if let Err(reason) = edit.apply(authoritative) {
                *authoritative = self.base;
                return Err(EditError {
                    transaction_id: self.transaction_id,
                    edit: edit.clone(),
                    reason,
                });
            }
        }
        debug_assert_eq!(authoritative.state_hash(), self.shadow.state_hash());
        Ok(TransactionOutcome {
            transaction_id: self.transaction_id,
            committed: true,
            journal: self.journal,
        })
    }

    /// Discard the shadow.
    #[must_use]
    pub fn rollback(self) -> TransactionOutcome {
        TransactionOutcome {
            transaction_id: self.transaction_id,
            committed: false,
            journal: self.journal,
        }
    }
}
