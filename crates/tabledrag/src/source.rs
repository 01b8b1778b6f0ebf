#![forbid(unsafe_code)]

//! Building the initial [`Sequence`] from caller rows.
//!
//! Rows arrive as [`RowSpec`]s, either built directly or parsed from string
//! attribute maps by a [`RowConnector`]. [`build_sequence`] checks them and
//! produces a committed-quality sequence:
//!
//! - `weight` and `depth` are each given on every row or on none. Missing
//!   weights default to position order, missing depths to 0.
//! - given weights must already agree with row order (strictly increasing);
//! - rows without an id get one from [`RowIdAllocator`];
//! - ids are unique, the first row is at depth 0, and no row is more than one
//!   level deeper than its predecessor;
//! - weights are renumbered to `1..=n`.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tabledrag_core::RowId;

use crate::node::Node;
use crate::renumber::renumber;
use crate::sequence::{Sequence, SequenceError};

/// Attribute holding the row id.
pub const ID_ATTRIBUTE: &str = "id";
/// Attribute holding the row order key.
pub const WEIGHT_ATTRIBUTE: &str = "weight";
/// Attribute holding the row nesting depth.
pub const DEPTH_ATTRIBUTE: &str = "depth";
/// Default attribute holding the row kind.
pub const DEFAULT_KIND_ATTRIBUTE: &str = "type";

/// Fatal errors while building an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    MalformedAttribute {
        index: usize,
        attribute: &'static str,
        value: String,
    },
    PartialAttribute {
        index: usize,
        attribute: &'static str,
    },
    WeightsNotIncreasing {
        index: usize,
        previous: i64,
        weight: i64,
    },
    DuplicateId {
        id: RowId,
    },
    FirstRowNotRoot {
        depth: u32,
    },
    DepthJump {
        index: usize,
        previous: u32,
        depth: u32,
    },
    InvalidNestingDistance,
    InvalidValidatorConfig {
        validator: &'static str,
        reason: String,
    },
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedAttribute {
                index,
                attribute,
                value,
            } => write!(f, "row {index}: malformed {attribute} attribute {value:?}"),
            Self::PartialAttribute { index, attribute } => write!(
                f,
                "row {index}: missing {attribute} attribute (given on other rows)"
            ),
            Self::WeightsNotIncreasing {
                index,
                previous,
                weight,
            } => write!(
                f,
                "row {index}: weight {weight} does not follow previous weight {previous}"
            ),
            Self::DuplicateId { id } => write!(f, "duplicate row id {id}"),
            Self::FirstRowNotRoot { depth } => {
                write!(f, "first row has depth {depth}, expected 0")
            }
            Self::DepthJump {
                index,
                previous,
                depth,
            } => write!(
                f,
                "row {index}: depth {depth} is more than one level below previous depth {previous}"
            ),
            Self::InvalidNestingDistance => {
                write!(f, "nesting drag distance must be greater than zero")
            }
            Self::InvalidValidatorConfig { validator, reason } => {
                write!(f, "invalid {validator} validator config: {reason}")
            }
        }
    }
}

impl std::error::Error for ConstructionError {}

/// Caller description of one initial row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RowSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub payload: BTreeMap<String, String>,
}

impl RowSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<RowId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = Some(weight);
        self
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

/// Turns one host row (a string attribute map) into a [`RowSpec`].
pub trait RowConnector {
    fn parse_row(
        &self,
        index: usize,
        attributes: &BTreeMap<String, String>,
    ) -> Result<RowSpec, ConstructionError>;
}

/// Default connector: integer `weight`/`depth` attributes, `id`, and a
/// configurable kind attribute. Everything else becomes payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributesConnector {
    pub kind_attribute: String,
}

impl Default for AttributesConnector {
    fn default() -> Self {
        Self {
            kind_attribute: DEFAULT_KIND_ATTRIBUTE.to_owned(),
        }
    }
}

impl AttributesConnector {
    #[must_use]
    pub fn with_kind_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.kind_attribute = attribute.into();
        self
    }
}

fn parse_int<T: std::str::FromStr>(
    index: usize,
    attribute: &'static str,
    raw: &str,
) -> Result<T, ConstructionError> {
    raw.trim()
        .parse()
        .map_err(|_| ConstructionError::MalformedAttribute {
            index,
            attribute,
            value: raw.to_owned(),
        })
}

impl RowConnector for AttributesConnector {
    fn parse_row(
        &self,
        index: usize,
        attributes: &BTreeMap<String, String>,
    ) -> Result<RowSpec, ConstructionError> {
        let mut spec = RowSpec::new();
        for (key, value) in attributes {
            match key.as_str() {
                ID_ATTRIBUTE => spec.id = Some(RowId::new(value.clone())),
                WEIGHT_ATTRIBUTE => {
                    spec.weight = Some(parse_int(index, WEIGHT_ATTRIBUTE, value)?);
                }
                DEPTH_ATTRIBUTE => spec.depth = Some(parse_int(index, DEPTH_ATTRIBUTE, value)?),
                other if other == self.kind_attribute => spec.kind = Some(value.clone()),
                _ => {
                    spec.payload.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(spec)
    }
}

/// Parse every attribute map through `connector`, in order.
pub fn parse_rows<C: RowConnector + ?Sized>(
    connector: &C,
    rows: &[BTreeMap<String, String>],
) -> Result<Vec<RowSpec>, ConstructionError> {
    rows.iter()
        .enumerate()
        .map(|(index, attributes)| connector.parse_row(index, attributes))
        .collect()
}

/// Deterministic ids (`row-1`, `row-2`, ...) for rows that arrive without one.
#[derive(Debug, Clone, Default)]
pub struct RowIdAllocator {
    next: u64,
    taken: FxHashSet<RowId>,
}

impl RowIdAllocator {
    /// Allocator that never hands out any of `taken`.
    #[must_use]
    pub fn avoiding(taken: impl IntoIterator<Item = RowId>) -> Self {
        Self {
            next: 1,
            taken: taken.into_iter().collect(),
        }
    }

    /// Next free id.
    pub fn allocate(&mut self) -> RowId {
        loop {
            let candidate = RowId::new(format!("row-{}", self.next.max(1)));
            self.next = self.next.max(1) + 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

fn check_all_or_none<T>(
    rows: &[RowSpec],
    attribute: &'static str,
    get: impl Fn(&RowSpec) -> Option<T>,
) -> Result<bool, ConstructionError> {
    let given = rows.iter().filter(|row| get(row).is_some()).count();
    if given == 0 {
        return Ok(false);
    }
    if let Some(index) = rows.iter().position(|row| get(row).is_none()) {
        return Err(ConstructionError::PartialAttribute { index, attribute });
    }
    Ok(true)
}

/// Build and check the initial sequence.
pub fn build_sequence(rows: Vec<RowSpec>) -> Result<Sequence, ConstructionError> {
    check_all_or_none(&rows, WEIGHT_ATTRIBUTE, |row| row.weight)?;
    check_all_or_none(&rows, DEPTH_ATTRIBUTE, |row| row.depth)?;

    for (index, pair) in rows.windows(2).enumerate() {
        if let (Some(previous), Some(weight)) = (pair[0].weight, pair[1].weight)
            && weight <= previous
        {
            return Err(ConstructionError::WeightsNotIncreasing {
                index: index + 1,
                previous,
                weight,
            });
        }
    }

    let mut seen = FxHashSet::default();
    for id in rows.iter().filter_map(|row| row.id.as_ref()) {
        if !seen.insert(id) {
            return Err(ConstructionError::DuplicateId { id: id.clone() });
        }
    }
    let mut allocator = RowIdAllocator::avoiding(seen.into_iter().cloned());

    let mut previous_depth: Option<u32> = None;
    let mut nodes = Vec::with_capacity(rows.len());
    for (index, (position, row)) in (1_i64..).zip(rows).enumerate() {
        let depth = row.depth.unwrap_or(0);
        match previous_depth {
            None if depth != 0 => return Err(ConstructionError::FirstRowNotRoot { depth }),
            Some(previous) if depth > previous.saturating_add(1) => {
                return Err(ConstructionError::DepthJump {
                    index,
                    previous,
                    depth,
                });
            }
            _ => {}
        }
        previous_depth = Some(depth);

        let id = row.id.unwrap_or_else(|| allocator.allocate());
        let mut node = Node::new(id, row.weight.unwrap_or(position), depth)
            .with_payload(row.payload);
        if let Some(kind) = row.kind {
            node = node.with_kind(kind);
        }
        nodes.push(node);
    }

    let mut sequence = Sequence::from_nodes(nodes).map_err(|err| match err {
        SequenceError::DuplicateId { id } | SequenceError::NotFound { id } => {
            ConstructionError::DuplicateId { id }
        }
    })?;
    renumber(&mut sequence);
    Ok(sequence)
}
