#![forbid(unsafe_code)]

//! Pluggable structural validators.
//!
//! A [`Validator`] inspects a complete proposed [`Sequence`] and may veto it
//! through the [`Verdict`] it is handed. It cannot mutate the proposal. The
//! [`ValidationChain`] runs every registered validator against the same
//! proposal, in registration order, without short-circuiting; the
//! transition is accepted iff nobody vetoed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tabledrag_core::RowId;

use crate::sequence::Sequence;

/// One rejection reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Veto {
    /// Name of the validator that vetoed.
    pub validator: &'static str,
    /// Offending row, when the reason is row-specific.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<RowId>,
    pub reason: String,
}

impl fmt::Display for Veto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "{}: row {node}: {}", self.validator, self.reason),
            None => write!(f, "{}: {}", self.validator, self.reason),
        }
    }
}

/// Collected vetoes for one proposal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    vetoes: Vec<Veto>,
    current: &'static str,
}

impl Verdict {
    /// Reject the proposal.
    pub fn veto(&mut self, node: Option<&RowId>, reason: impl Into<String>) {
        self.vetoes.push(Veto {
            validator: self.current,
            node: node.cloned(),
            reason: reason.into(),
        });
    }

    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.vetoes.is_empty()
    }

    #[must_use]
    pub fn vetoes(&self) -> &[Veto] {
        &self.vetoes
    }

    #[must_use]
    pub fn into_vetoes(self) -> Vec<Veto> {
        self.vetoes
    }

    fn begin(&mut self, validator: &'static str) {
        self.current = validator;
    }
}

/// Inspect a proposal, optionally veto.
pub trait Validator: fmt::Debug {
    /// Stable name used in vetoes and logs.
    fn name(&self) -> &'static str;

    fn evaluate(&self, proposal: &Sequence, verdict: &mut Verdict);
}

/// Ordered validator list.
#[derive(Debug, Default)]
pub struct ValidationChain {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidationChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    #[must_use]
    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.push(Box::new(validator));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Run every validator against `proposal`.
    #[must_use]
    pub fn evaluate(&self, proposal: &Sequence) -> Verdict {
        let mut verdict = Verdict::default();
        for validator in &self.validators {
            verdict.begin(validator.name());
            validator.evaluate(proposal, &mut verdict);
        }
        verdict
    }
}

impl Extend<Box<dyn Validator>> for ValidationChain {
    fn extend<T: IntoIterator<Item = Box<dyn Validator>>>(&mut self, iter: T) {
        self.validators.extend(iter);
    }
}

/// First row at depth 0, and no row more than one level deeper than the row
/// before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeValidator;

impl Validator for ShapeValidator {
    fn name(&self) -> &'static str {
        "shape"
    }

    fn evaluate(&self, proposal: &Sequence, verdict: &mut Verdict) {
        if let Some(first) = proposal.nodes().first()
            && first.depth() != 0
        {
            verdict.veto(
                Some(first.id()),
                format!("first row has depth {}", first.depth()),
            );
        }
        for pair in proposal.nodes().windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.depth() > prev.depth().saturating_add(1) {
                verdict.veto(
                    Some(next.id()),
                    format!(
                        "depth {} follows depth {} without a parent",
                        next.depth(),
                        prev.depth()
                    ),
                );
            }
        }
    }
}

/// Depth ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxDepthValidator {
    pub max: u32,
}

impl Validator for MaxDepthValidator {
    fn name(&self) -> &'static str {
        "max_depth"
    }

    fn evaluate(&self, proposal: &Sequence, verdict: &mut Verdict) {
        for node in proposal {
            if node.depth() > self.max {
                verdict.veto(
                    Some(node.id()),
                    format!("depth {} exceeds maximum {}", node.depth(), self.max),
                );
            }
        }
    }
}

/// Allowed parent kinds per child kind.
///
/// Root rows are exempt, as are rows deeper than any open parent. A nested
/// row whose kind is missing, or has no entry in the allow-list, cannot sit
/// under anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeNestingValidator {
    pub nestable: BTreeMap<String, BTreeSet<String>>,
}

impl TypeNestingValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `child` kinds directly under `parent` kinds.
    #[must_use]
    pub fn allow(mut self, child: impl Into<String>, parent: impl Into<String>) -> Self {
        self.nestable
            .entry(child.into())
            .or_default()
            .insert(parent.into());
        self
    }

    fn permits(&self, child: Option<&str>, parent: Option<&str>) -> bool {
        match (child, parent) {
            (Some(child), Some(parent)) => self
                .nestable
                .get(child)
                .is_some_and(|parents| parents.contains(parent)),
            _ => false,
        }
    }
}

impl Validator for TypeNestingValidator {
    fn name(&self) -> &'static str {
        "types"
    }

    fn evaluate(&self, proposal: &Sequence, verdict: &mut Verdict) {
        // Indices of the open ancestors of the current row, one per depth.
        // Sized by the row count, never by the depth values themselves.
        let mut path: Vec<usize> = Vec::new();
        let nodes = proposal.nodes();
        for (index, node) in nodes.iter().enumerate() {
            let depth = usize::try_from(node.depth()).unwrap_or(usize::MAX);
            if depth > path.len() {
                // No parent on the open path; the shape check reports it.
                continue;
            }
            path.truncate(depth);
            if let Some(&parent) = path.last() {
                let parent = &nodes[parent];
                if !self.permits(node.kind(), parent.kind()) {
                    verdict.veto(
                        Some(node.id()),
                        format!(
                            "kind {} cannot nest under kind {}",
                            node.kind().unwrap_or("<none>"),
                            parent.kind().unwrap_or("<none>")
                        ),
                    );
                }
            }
            path.push(index);
        }
    }
}

/// Cap on direct children per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxChildrenValidator {
    pub max: usize,
}

impl Validator for MaxChildrenValidator {
    fn name(&self) -> &'static str {
        "max_children"
    }

    fn evaluate(&self, proposal: &Sequence, verdict: &mut Verdict) {
        let mut counts = vec![0_usize; proposal.len()];
        for index in 0..proposal.len() {
            if let Some(parent) = proposal.parent_index(index) {
                counts[parent] += 1;
            }
        }
        for (node, count) in proposal.iter().zip(counts) {
            if count > self.max {
                verdict.veto(
                    Some(node.id()),
                    format!("{count} children exceed maximum {}", self.max),
                );
            }
        }
    }
}
