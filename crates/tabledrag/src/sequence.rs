#![forbid(unsafe_code)]

//! Ordered, depth-annotated list with tree-derived queries.
//!
//! The tree is implicit. Sequence order is the pre-order traversal, and:
//!
//! - a node's **parent** is the nearest preceding node whose depth is one
//!   less than its own;
//! - a node's **subtree extent** is the maximal contiguous run right after
//!   it whose depths are strictly greater than its own.
//!
//! Every query is a linear scan. Lists driven by pointer gestures are small,
//! and a flat `Vec` keeps clones (shadow copies) cheap and alias-free.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::Serialize;
use tabledrag_core::RowId;

use crate::node::Node;

/// Errors from sequence queries and splices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    NotFound { id: RowId },
    DuplicateId { id: RowId },
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "row {id} not found"),
            Self::DuplicateId { id } => write!(f, "duplicate row id {id}"),
        }
    }
}

impl std::error::Error for SequenceError {}

/// Ordered list of [`Node`]s whose order encodes the tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Sequence {
    nodes: Vec<Node>,
}

impl Sequence {
    /// Build from nodes in display order, rejecting duplicate ids.
    ///
    /// Depth shape is not checked here; that is the job of the validation
    /// chain (and of construction from row specs).
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, SequenceError> {
        let mut seen = FxHashSet::default();
        for node in &nodes {
            if !seen.insert(node.id()) {
                return Err(SequenceError::DuplicateId {
                    id: node.id().clone(),
                });
            }
        }
        Ok(Self { nodes })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in display order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Ids in display order.
    #[must_use]
    pub fn ids(&self) -> Vec<RowId> {
        self.nodes.iter().map(|node| node.id().clone()).collect()
    }

    #[must_use]
    pub fn get(&self, id: &RowId) -> Option<&Node> {
        self.position(id).map(|index| &self.nodes[index])
    }

    #[must_use]
    pub fn contains(&self, id: &RowId) -> bool {
        self.position(id).is_some()
    }

    /// Display index of `id`.
    pub fn index_of(&self, id: &RowId) -> Result<usize, SequenceError> {
        self.position(id)
            .ok_or_else(|| SequenceError::NotFound { id: id.clone() })
    }

    /// Descendants of `id`: the contiguous run after it with greater depth.
    pub fn subtree_of(&self, id: &RowId) -> Result<&[Node], SequenceError> {
        let index = self.index_of(id)?;
        Ok(&self.nodes[index + 1..self.subtree_end(index)])
    }

    /// Direct children of `id` (descendants exactly one level deeper).
    pub fn children_of(&self, id: &RowId) -> Result<Vec<&Node>, SequenceError> {
        let index = self.index_of(id)?;
        let depth = self.nodes[index].depth();
        Ok(self.nodes[index + 1..self.subtree_end(index)]
            .iter()
            .filter(|node| node.depth().checked_sub(1) == Some(depth))
            .collect())
    }

    /// Nearest preceding node one level up; `None` at depth 0.
    pub fn parent_of(&self, id: &RowId) -> Result<Option<&Node>, SequenceError> {
        let index = self.index_of(id)?;
        Ok(self.parent_index(index).map(|parent| &self.nodes[parent]))
    }

    /// Ancestors of `id`, nearest first, ending at depth 0.
    pub fn ancestors_of(&self, id: &RowId) -> Result<Vec<&Node>, SequenceError> {
        let index = self.index_of(id)?;
        let mut wanted = self.nodes[index].depth();
        let mut out = Vec::new();
        let mut cursor = index;
        while wanted > 0 && cursor > 0 {
            cursor -= 1;
            let node = &self.nodes[cursor];
            if node.depth() == wanted - 1 {
                out.push(node);
                wanted -= 1;
            }
        }
        Ok(out)
    }

    /// Relocate the single node `id` (not its subtree) to immediately
    /// precede `before`, or to the end when `before` is `None`.
    ///
    /// Pure splice: depths are untouched and nothing is validated. Moving a
    /// node before itself is a no-op.
    pub fn move_node(&mut self, id: &RowId, before: Option<&RowId>) -> Result<(), SequenceError> {
        let from = self.index_of(id)?;
        if let Some(before) = before {
            self.index_of(before)?;
            if before == id {
                return Ok(());
            }
        }
        let node = self.nodes.remove(from);
        let at = match before {
            Some(before) => self.index_of(before)?,
            None => self.nodes.len(),
        };
        self.nodes.insert(at, node);
        Ok(())
    }

    /// Deterministic structural hash over `(id, weight, depth)` in order.
    ///
    /// Intended for transaction journals and log correlation.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0001_0000_01b3;

        fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
            for byte in bytes {
                *hash ^= u64::from(*byte);
                *hash = hash.wrapping_mul(PRIME);
            }
        }

        let mut hash = OFFSET_BASIS;
        mix_bytes(&mut hash, &(self.nodes.len() as u64).to_le_bytes());
        for node in &self.nodes {
            let id = node.id().as_str();
            mix_bytes(&mut hash, &(id.len() as u64).to_le_bytes());
            mix_bytes(&mut hash, id.as_bytes());
            mix_bytes(&mut hash, &node.weight().to_le_bytes());
            mix_bytes(&mut hash, &node.depth().to_le_bytes());
        }
        hash
    }

    fn position(&self, id: &RowId) -> Option<usize> {
        self.nodes.iter().position(|node| node.id() == id)
    }

    /// Exclusive end of the subtree extent of the node at `index`.
    pub(crate) fn subtree_end(&self, index: usize) -> usize {
        let depth = self.nodes[index].depth();
        let mut end = index + 1;
        while end < self.nodes.len() && self.nodes[end].depth() > depth {
            end += 1;
        }
        end
    }

    pub(crate) fn parent_index(&self, index: usize) -> Option<usize> {
        let depth = self.nodes[index].depth();
        if depth == 0 {
            return None;
        }
        (0..index)
            .rev()
            .find(|&cursor| self.nodes[cursor].depth() == depth - 1)
    }

    pub(crate) fn node_mut(&mut self, id: &RowId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id() == id)
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    /// Remove every node whose id is in `ids`, keeping their relative order.
    ///
    /// All ids must be present; otherwise nothing is removed.
    pub(crate) fn take_block(&mut self, ids: &[RowId]) -> Result<Vec<Node>, SequenceError> {
        for id in ids {
            self.index_of(id)?;
        }
        let wanted: FxHashSet<&RowId> = ids.iter().collect();
        let (block, rest): (Vec<Node>, Vec<Node>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|node| wanted.contains(node.id()));
        self.nodes = rest;
        Ok(block)
    }

    /// Insert `block` so its first node lands at `index`.
    pub(crate) fn insert_block(&mut self, index: usize, block: Vec<Node>) {
        let index = index.min(self.nodes.len());
        self.nodes.splice(index..index, block);
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(raw: &str) -> RowId {
        RowId::from(raw)
    }

    /// ```text
    /// a
    ///   b
    ///     c
    ///   d
    /// e
    ///   f
    /// ```
    fn nested() -> Sequence {
        Sequence::from_nodes(vec![
            Node::new("a", 1, 0),
            Node::new("b", 2, 1),
            Node::new("c", 3, 2),
            Node::new("d", 4, 1),
            Node::new("e", 5, 0),
            Node::new("f", 6, 1),
        ])
        .expect("valid sequence")
    }

    fn ids(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|node| node.id().as_str()).collect()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Sequence::from_nodes(vec![Node::new("a", 1, 0), Node::new("a", 2, 0)])
            .expect_err("duplicate");
        assert_eq!(err, SequenceError::DuplicateId { id: rid("a") });
    }

    #[test]
    fn subtree_stops_at_first_shallower_or_equal_node() {
        let seq = nested();
        assert_eq!(ids(seq.subtree_of(&rid("a")).unwrap()), vec!["b", "c", "d"]);
        assert_eq!(ids(seq.subtree_of(&rid("b")).unwrap()), vec!["c"]);
        assert!(seq.subtree_of(&rid("d")).unwrap().is_empty());
        assert_eq!(ids(seq.subtree_of(&rid("e")).unwrap()), vec!["f"]);
    }

    #[test]
    fn subtree_of_missing_row_is_not_found() {
        assert_eq!(
            nested().subtree_of(&rid("zz")),
            Err(SequenceError::NotFound { id: rid("zz") })
        );
    }

    #[test]
    fn parent_is_nearest_preceding_shallower_by_one() {
        let seq = nested();
        assert_eq!(seq.parent_of(&rid("a")).unwrap(), None);
        assert_eq!(seq.parent_of(&rid("c")).unwrap().map(Node::id), Some(&rid("b")));
        assert_eq!(seq.parent_of(&rid("d")).unwrap().map(Node::id), Some(&rid("a")));
        assert_eq!(seq.parent_of(&rid("f")).unwrap().map(Node::id), Some(&rid("e")));
    }

    #[test]
    fn children_are_direct_only() {
        let seq = nested();
        let children: Vec<&str> = seq
            .children_of(&rid("a"))
            .unwrap()
            .into_iter()
            .map(|node| node.id().as_str())
            .collect();
        assert_eq!(children, vec!["b", "d"]);
    }

    #[test]
    fn ancestors_are_nearest_first() {
        let seq = nested();
        let ancestors: Vec<&str> = seq
            .ancestors_of(&rid("c"))
            .unwrap()
            .into_iter()
            .map(|node| node.id().as_str())
            .collect();
        assert_eq!(ancestors, vec!["b", "a"]);
        assert!(seq.ancestors_of(&rid("e")).unwrap().is_empty());
    }

    #[test]
    fn queries_tolerate_maximum_depth() {
        let seq = Sequence::from_nodes(vec![
            Node::new("a", 1, 0),
            Node::new("deep", 2, u32::MAX),
            Node::new("deeper", 3, u32::MAX),
        ])
        .expect("unique ids");
        assert!(seq.children_of(&rid("deep")).unwrap().is_empty());
        let ancestors: Vec<&str> = seq
            .ancestors_of(&rid("deep"))
            .unwrap()
            .into_iter()
            .map(|node| node.id().as_str())
            .collect();
        assert!(ancestors.is_empty());
    }

    #[test]
    fn move_node_splices_single_node_only() {
        let mut seq = nested();
        seq.move_node(&rid("b"), Some(&rid("e"))).unwrap();
        assert_eq!(ids(seq.nodes()), vec!["a", "c", "d", "b", "e", "f"]);
        // Depth untouched even though the result is no longer a sane tree.
        assert_eq!(seq.get(&rid("b")).unwrap().depth(), 1);
    }

    #[test]
    fn move_node_to_end() {
        let mut seq = nested();
        seq.move_node(&rid("a"), None).unwrap();
        assert_eq!(ids(seq.nodes()), vec!["b", "c", "d", "e", "f", "a"]);
    }

    #[test]
    fn move_node_before_itself_is_noop() {
        let mut seq = nested();
        let before = seq.clone();
        seq.move_node(&rid("c"), Some(&rid("c"))).unwrap();
        assert_eq!(seq, before);
    }

    #[test]
    fn move_node_with_missing_target_leaves_sequence_untouched() {
        let mut seq = nested();
        let before = seq.clone();
        assert!(seq.move_node(&rid("c"), Some(&rid("nope"))).is_err());
        assert_eq!(seq, before);
    }

    #[test]
    fn take_block_is_all_or_nothing() {
        let mut seq = nested();
        let before = seq.clone();
        assert!(seq.take_block(&[rid("b"), rid("missing")]).is_err());
        assert_eq!(seq, before);

        let block = seq.take_block(&[rid("c"), rid("b")]).unwrap();
        assert_eq!(ids(&block), vec!["b", "c"]);
        assert_eq!(ids(seq.nodes()), vec!["a", "d", "e", "f"]);
    }

    #[test]
    fn state_hash_tracks_structure() {
        let seq = nested();
        let mut moved = seq.clone();
        moved.move_node(&rid("f"), Some(&rid("a"))).unwrap();
        assert_eq!(seq.state_hash(), nested().state_hash());
        assert_ne!(seq.state_hash(), moved.state_hash());
    }
}
