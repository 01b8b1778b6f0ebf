#![forbid(unsafe_code)]

//! Dense order keys.

use crate::sequence::Sequence;

/// Reassign weights `1..=n` in current sequence order.
///
/// Returns `true` when any weight changed. Running it twice is the same as
/// running it once.
pub fn renumber(sequence: &mut Sequence) -> bool {
    let mut changed = false;
    for (node, weight) in sequence.nodes_mut().zip(1_i64..) {
        if node.weight() != weight {
            node.set_weight(weight);
            changed = true;
        }
    }
    changed
}

/// Whether weights are exactly `1..=n` in order.
#[must_use]
pub fn is_dense(sequence: &Sequence) -> bool {
    sequence
        .iter()
        .zip(1_i64..)
        .all(|(node, weight)| node.weight() == weight)
}
