#![forbid(unsafe_code)]

//! Move planning: from a drag position to an ordered list of edits.
//!
//! # Anchoring
//!
//! Everything the planner needs from the start of the gesture lives in a
//! [`GestureAnchor`]: the dragged row, its depth, the pointer x at press
//! time, and the subtree members with their own start depths. Children are
//! captured once at drag start and never re-derived while the gesture runs,
//! so the block that travels with the dragged row cannot grow or shrink
//! mid-drag.
//!
//! Depth targets are always `start depth + indent delta`, computed from the
//! anchor rather than from live depths. Repeated pointer updates inside one
//! gesture therefore converge on the same proposal instead of compounding.
//!
//! # Plan shape
//!
//! 1. `touching_above` (if usable) moves the block before that row.
//! 2. Otherwise `touching_below` (if usable) moves the block after that
//!    row's whole subtree.
//! 3. If the anchored target depth is non-negative and differs from the live
//!    depth, every block member is re-indented by the same delta.
//! 4. A renumber edit always closes the plan.
//!
//! A target is unusable when it is part of the dragged block or is not in
//! the sequence.

use serde::Serialize;
use tabledrag_core::{RowId, SensorHit};

use crate::renumber::renumber;
use crate::sequence::{Sequence, SequenceError};

/// A subtree member recorded at drag start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedChild {
    pub id: RowId,
    pub start_depth: u32,
}

/// Drag-start snapshot for one gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GestureAnchor {
    dragged: RowId,
    start_depth: u32,
    start_pointer_x: i32,
    children: Vec<CapturedChild>,
}

impl GestureAnchor {
    /// Snapshot `dragged` and its current subtree.
    pub fn capture(
        sequence: &Sequence,
        dragged: &RowId,
        start_pointer_x: i32,
    ) -> Result<Self, SequenceError> {
        let start_depth = sequence
            .get(dragged)
            .ok_or_else(|| SequenceError::NotFound {
                id: dragged.clone(),
            })?
            .depth();
        let children = sequence
            .subtree_of(dragged)?
            .iter()
            .map(|node| CapturedChild {
                id: node.id().clone(),
                start_depth: node.depth(),
            })
            .collect();
        Ok(Self {
            dragged: dragged.clone(),
            start_depth,
            start_pointer_x,
            children,
        })
    }

    #[must_use]
    pub fn dragged(&self) -> &RowId {
        &self.dragged
    }

    #[must_use]
    pub const fn start_depth(&self) -> u32 {
        self.start_depth
    }

    #[must_use]
    pub const fn start_pointer_x(&self) -> i32 {
        self.start_pointer_x
    }

    #[must_use]
    pub fn children(&self) -> &[CapturedChild] {
        &self.children
    }

    /// Dragged row first, then captured children in their original order.
    #[must_use]
    pub fn block_ids(&self) -> Vec<RowId> {
        std::iter::once(self.dragged.clone())
            .chain(self.children.iter().map(|child| child.id.clone()))
            .collect()
    }

    /// Whether `id` travels with the drag.
    #[must_use]
    pub fn is_member(&self, id: &RowId) -> bool {
        self.dragged == *id || self.children.iter().any(|child| child.id == *id)
    }
}

/// Primitive, deterministic sequence edit.
///
/// Each edit checks its preconditions before touching the sequence, so a
/// failed edit leaves the sequence unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "edit", rename_all = "snake_case")]
pub enum Edit {
    /// Splice `block` (kept in order) to sit immediately before `target`.
    MoveBefore { block: Vec<RowId>, target: RowId },
    /// Splice `block` to sit immediately after the last member of
    /// `target`'s subtree.
    MoveAfterSubtree { block: Vec<RowId>, target: RowId },
    /// Assign absolute depths.
    SetDepths { depths: Vec<(RowId, u32)> },
    /// Reassign weights `1..=n`.
    Renumber,
}

impl Edit {
    /// Apply to `sequence` in place.
    pub fn apply(&self, sequence: &mut Sequence) -> Result<(), SequenceError> {
        match self {
            Self::MoveBefore { block, target } => {
                sequence.index_of(target)?;
                if block.contains(target) {
                    return Ok(());
                }
                let nodes = sequence.take_block(block)?;
                let at = sequence.index_of(target)?;
                sequence.insert_block(at, nodes);
            }
            Self::MoveAfterSubtree { block, target } => {
                sequence.index_of(target)?;
                if block.contains(target) {
                    return Ok(());
                }
                let nodes = sequence.take_block(block)?;
                let at = sequence.index_of(target)?;
                let end = sequence.subtree_end(at);
                sequence.insert_block(end, nodes);
            }
            Self::SetDepths { depths } => {
                for (id, _) in depths {
                    sequence.index_of(id)?;
                }
                for (id, depth) in depths {
                    if let Some(node) = sequence.node_mut(id) {
                        node.set_depth(*depth);
                    }
                }
            }
            Self::Renumber => {
                renumber(sequence);
            }
        }
        Ok(())
    }

    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MoveBefore { .. } => "move_before",
            Self::MoveAfterSubtree { .. } => "move_after_subtree",
            Self::SetDepths { .. } => "set_depths",
            Self::Renumber => "renumber",
        }
    }
}

/// Planner output for one pointer update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub indent_delta: i64,
    pub edits: Vec<Edit>,
}

impl Plan {
    /// Whether the plan relocates the dragged block.
    #[must_use]
    pub fn moves_block(&self) -> bool {
        self.edits.iter().any(|edit| {
            matches!(
                edit,
                Edit::MoveBefore { .. } | Edit::MoveAfterSubtree { .. }
            )
        })
    }

    /// Whether the plan re-indents the dragged block.
    #[must_use]
    pub fn reindents(&self) -> bool {
        self.edits
            .iter()
            .any(|edit| matches!(edit, Edit::SetDepths { .. }))
    }
}

/// Turns drag positions into edit lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlanner {
    nesting_drag_distance: u32,
}

impl MovePlanner {
    /// `nesting_drag_distance` is the number of pixels per indent level.
    /// Zero is treated as one.
    #[must_use]
    pub const fn new(nesting_drag_distance: u32) -> Self {
        Self {
            nesting_drag_distance,
        }
    }

    #[must_use]
    pub const fn nesting_drag_distance(&self) -> u32 {
        self.nesting_drag_distance
    }

    /// `floor((pointer_x - start_x) / nesting_drag_distance)`.
    #[must_use]
    pub fn indent_delta(&self, start_pointer_x: i32, pointer_x: i32) -> i64 {
        let distance = i64::from(self.nesting_drag_distance.max(1));
        (i64::from(pointer_x) - i64::from(start_pointer_x)).div_euclid(distance)
    }

    /// Plan the edits for the current pointer position.
    #[must_use]
    pub fn plan(
        &self,
        sequence: &Sequence,
        anchor: &GestureAnchor,
        pointer_x: i32,
        hit: &SensorHit,
    ) -> Plan {
        let indent_delta = self.indent_delta(anchor.start_pointer_x, pointer_x);
        let usable = |id: &&RowId| !anchor.is_member(id) && sequence.contains(id);
        let mut edits = Vec::with_capacity(3);

        if let Some(target) = hit.touching_above.as_ref().filter(usable) {
            edits.push(Edit::MoveBefore {
                block: anchor.block_ids(),
                target: target.clone(),
            });
        } else if let Some(target) = hit.touching_below.as_ref().filter(usable) {
            edits.push(Edit::MoveAfterSubtree {
                block: anchor.block_ids(),
                target: target.clone(),
            });
        }

        if let Some(depths) = self.depth_edit(sequence, anchor, indent_delta) {
            edits.push(Edit::SetDepths { depths });
        }

        edits.push(Edit::Renumber);
        Plan {
            indent_delta,
            edits,
        }
    }

    fn depth_edit(
        &self,
        sequence: &Sequence,
        anchor: &GestureAnchor,
        indent_delta: i64,
    ) -> Option<Vec<(RowId, u32)>> {
        let shifted = |start: u32| u32::try_from(i64::from(start) + indent_delta).ok();
        let target = shifted(anchor.start_depth)?;
        let live = sequence.get(&anchor.dragged)?.depth();
        if target == live {
            return None;
        }
        let mut depths = Vec::with_capacity(1 + anchor.children.len());
        depths.push((anchor.dragged.clone(), target));
        for child in &anchor.children {
            depths.push((child.id.clone(), shifted(child.start_depth)?));
        }
        Some(depths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn rid(raw: &str) -> RowId {
        RowId::from(raw)
    }

    fn seq(rows: &[(&str, u32)]) -> Sequence {
        Sequence::from_nodes(
            rows.iter()
                .zip(1_i64..)
                .map(|((id, depth), weight)| Node::new(*id, weight, *depth))
                .collect(),
        )
        .expect("valid sequence")
    }

    fn shape(sequence: &Sequence) -> Vec<(String, u32)> {
        sequence
            .iter()
            .map(|node| (node.id().to_string(), node.depth()))
            .collect()
    }

    fn apply_all(sequence: &mut Sequence, plan: &Plan) {
        for edit in &plan.edits {
            edit.apply(sequence).expect("edit applies");
        }
    }

    #[test]
    fn indent_delta_floors_toward_negative_infinity() {
        let planner = MovePlanner::new(40);
        assert_eq!(planner.indent_delta(100, 100), 0);
        assert_eq!(planner.indent_delta(100, 139), 0);
        assert_eq!(planner.indent_delta(100, 140), 1);
        assert_eq!(planner.indent_delta(100, 99), -1);
        assert_eq!(planner.indent_delta(100, 60), -1);
        assert_eq!(planner.indent_delta(100, 59), -2);
    }

    #[test]
    fn zero_distance_is_clamped() {
        assert_eq!(MovePlanner::new(0).indent_delta(0, 3), 3);
    }

    #[test]
    fn anchor_captures_subtree_with_start_depths() {
        let s = seq(&[("a", 0), ("b", 1), ("c", 2), ("d", 0)]);
        let anchor = GestureAnchor::capture(&s, &rid("a"), 10).expect("capture");
        assert_eq!(anchor.start_depth(), 0);
        assert_eq!(anchor.block_ids(), vec![rid("a"), rid("b"), rid("c")]);
        assert!(anchor.is_member(&rid("c")));
        assert!(!anchor.is_member(&rid("d")));
    }

    #[test]
    fn anchor_for_missing_row_fails() {
        let s = seq(&[("a", 0)]);
        assert_eq!(
            GestureAnchor::capture(&s, &rid("x"), 0),
            Err(SequenceError::NotFound { id: rid("x") })
        );
    }

    #[test]
    fn above_moves_block_before_target() {
        let s = seq(&[("a", 0), ("b", 0), ("c", 1), ("d", 0)]);
        let anchor = GestureAnchor::capture(&s, &rid("b"), 0).expect("capture");
        let plan = MovePlanner::new(40).plan(&s, &anchor, 0, &SensorHit::above("a"));
        assert_eq!(
            plan.edits,
            vec![
                Edit::MoveBefore {
                    block: vec![rid("b"), rid("c")],
                    target: rid("a"),
                },
                Edit::Renumber,
            ]
        );
        let mut shadow = s.clone();
        apply_all(&mut shadow, &plan);
        assert_eq!(
            shape(&shadow),
            vec![
                ("b".to_owned(), 0),
                ("c".to_owned(), 1),
                ("a".to_owned(), 0),
                ("d".to_owned(), 0),
            ]
        );
    }

    #[test]
    fn below_lands_after_target_subtree() {
        let s = seq(&[("a", 0), ("b", 0), ("c", 1), ("d", 2), ("e", 0)]);
        let anchor = GestureAnchor::capture(&s, &rid("a"), 0).expect("capture");
        let plan = MovePlanner::new(40).plan(&s, &anchor, 0, &SensorHit::below("b"));
        let mut shadow = s.clone();
        apply_all(&mut shadow, &plan);
        let ids: Vec<String> = shadow.iter().map(|n| n.id().to_string()).collect();
        assert_eq!(ids, vec!["b", "c", "d", "a", "e"]);
    }

    #[test]
    fn above_takes_priority_over_below() {
        let s = seq(&[("a", 0), ("b", 0), ("c", 0)]);
        let anchor = GestureAnchor::capture(&s, &rid("c"), 0).expect("capture");
        let plan = MovePlanner::new(40).plan(&s, &anchor, 0, &SensorHit::both("b", "a"));
        assert_eq!(
            plan.edits[0],
            Edit::MoveBefore {
                block: vec![rid("c")],
                target: rid("b"),
            }
        );
        assert_eq!(plan.edits.len(), 2);
    }

    #[test]
    fn unusable_above_falls_through_to_below() {
        let s = seq(&[("a", 0), ("b", 0), ("c", 0)]);
        let anchor = GestureAnchor::capture(&s, &rid("b"), 0).expect("capture");
        let plan = MovePlanner::new(40).plan(&s, &anchor, 0, &SensorHit::both("b", "c"));
        assert!(matches!(
            &plan.edits[0],
            Edit::MoveAfterSubtree { target, .. } if *target == rid("c")
        ));
    }

    #[test]
    fn targets_inside_the_block_are_ignored() {
        let s = seq(&[("a", 0), ("b", 1), ("c", 0)]);
        let anchor = GestureAnchor::capture(&s, &rid("a"), 0).expect("capture");
        let plan = MovePlanner::new(40).plan(&s, &anchor, 0, &SensorHit::below("b"));
        assert_eq!(plan.edits, vec![Edit::Renumber]);
        assert!(!plan.moves_block());
    }

    #[test]
    fn unknown_target_is_ignored() {
        let s = seq(&[("a", 0), ("b", 0)]);
        let anchor = GestureAnchor::capture(&s, &rid("a"), 0).expect("capture");
        let plan = MovePlanner::new(40).plan(&s, &anchor, 0, &SensorHit::above("ghost"));
        assert_eq!(plan.edits, vec![Edit::Renumber]);
    }

    #[test]
    fn reindent_moves_children_rigidly() {
        let s = seq(&[("a", 0), ("b", 0), ("c", 1), ("d", 2)]);
        let anchor = GestureAnchor::capture(&s, &rid("b"), 0).expect("capture");
        let plan = MovePlanner::new(40).plan(&s, &anchor, 45, &SensorHit::none());
        assert_eq!(plan.indent_delta, 1);
        assert!(plan.reindents());
        let mut shadow = s.clone();
        apply_all(&mut shadow, &plan);
        assert_eq!(
            shape(&shadow),
            vec![
                ("a".to_owned(), 0),
                ("b".to_owned(), 1),
                ("c".to_owned(), 2),
                ("d".to_owned(), 3),
            ]
        );
    }

    #[test]
    fn negative_target_depth_drops_the_indent_edit() {
        let s = seq(&[("a", 0), ("b", 0)]);
        let anchor = GestureAnchor::capture(&s, &rid("b"), 100).expect("capture");
        let plan = MovePlanner::new(40).plan(&s, &anchor, 0, &SensorHit::none());
        assert_eq!(plan.indent_delta, -3);
        assert!(!plan.reindents());
    }

    #[test]
    fn depth_target_is_anchored_not_live() {
        let s = seq(&[("a", 0), ("b", 0)]);
        let anchor = GestureAnchor::capture(&s, &rid("b"), 0).expect("capture");
        let planner = MovePlanner::new(40);

        let first = planner.plan(&s, &anchor, 40, &SensorHit::none());
        let mut live = s.clone();
        apply_all(&mut live, &first);
        assert_eq!(live.get(&rid("b")).map(Node::depth), Some(1));

        // Same pointer position again: live depth already matches the anchor.
        let second = planner.plan(&live, &anchor, 40, &SensorHit::none());
        assert!(!second.reindents());

        // Back to the start x: depth returns to the anchored start depth.
        let third = planner.plan(&live, &anchor, 0, &SensorHit::none());
        assert_eq!(
            third.edits[0],
            Edit::SetDepths {
                depths: vec![(rid("b"), 0)],
            }
        );
    }

    #[test]
    fn failing_edit_leaves_sequence_untouched() {
        let mut s = seq(&[("a", 0), ("b", 0)]);
        let before = s.clone();
        let edit = Edit::SetDepths {
            depths: vec![(rid("a"), 3), (rid("missing"), 1)],
        };
        assert!(edit.apply(&mut s).is_err());
        assert_eq!(s, before);

        let edit = Edit::MoveBefore {
            block: vec![rid("a"), rid("missing")],
            target: rid("b"),
        };
        assert!(edit.apply(&mut s).is_err());
        assert_eq!(s, before);
    }

    #[test]
    fn edits_serialize_with_a_tag() {
        let json = serde_json::to_value(Edit::MoveBefore {
            block: vec![rid("a")],
            target: rid("b"),
        })
        .expect("serialize");
        assert_eq!(json["edit"], "move_before");
        assert_eq!(json["target"], "b");
    }
}
