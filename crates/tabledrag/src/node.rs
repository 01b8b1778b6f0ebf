#![forbid(unsafe_code)]

//! One list item.

use std::collections::BTreeMap;

use serde::Serialize;
use tabledrag_core::RowId;

/// A row in the ordered, depth-annotated list.
///
/// `id` is fixed at construction. `weight` and `depth` only change through a
/// committed transaction, which is why their setters are crate-private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    id: RowId,
    weight: i64,
    depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    payload: BTreeMap<String, String>,
}

impl Node {
    #[must_use]
    pub fn new(id: impl Into<RowId>, weight: i64, depth: u32) -> Self {
        Self {
            id: id.into(),
            weight,
            depth,
            kind: None,
            payload: BTreeMap::new(),
        }
    }

    /// Set the declared kind (checked by the type-nesting validator).
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Replace the caller payload.
    #[must_use]
    pub fn with_payload(mut self, payload: BTreeMap<String, String>) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn id(&self) -> &RowId {
        &self.id
    }

    #[must_use]
    pub const fn weight(&self) -> i64 {
        self.weight
    }

    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    #[must_use]
    pub fn payload(&self) -> &BTreeMap<String, String> {
        &self.payload
    }

    pub(crate) fn set_weight(&mut self, weight: i64) {
        self.weight = weight;
    }

    pub(crate) fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }
}
