#![forbid(unsafe_code)]

//! Position sensing: which displayed row the pointer is touching.
//!
//! The reorder engine never does pixel geometry. It consumes a
//! [`SensorHit`]: "the dragged block should go above this row" or "below
//! this row". Hosts implement [`PositionSensor`] against their real layout;
//! [`RowStrip`] is a reference implementation for a vertical stack of rows
//! with a uniform height.
//!
//! # Hit zones
//!
//! Each row is split in half. A pointer over the upper half reports the row
//! as `touching_above` (the block lands before it); over the lower half it
//! reports `touching_below` (the block lands after the row's subtree).
//! Pointers above the strip touch the first row from above, pointers below
//! the strip touch the last row from below.

use serde::{Deserialize, Serialize};

use crate::geometry::PointerPosition;
use crate::id::RowId;

/// Sensor output for one pointer position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorHit {
    /// Row whose upper hit zone the pointer is in.
    pub touching_above: Option<RowId>,
    /// Row whose lower hit zone the pointer is in.
    pub touching_below: Option<RowId>,
}

impl SensorHit {
    /// No row touched.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Pointer is in the upper zone of `row`.
    #[must_use]
    pub fn above(row: impl Into<RowId>) -> Self {
        Self {
            touching_above: Some(row.into()),
            touching_below: None,
        }
    }

    /// Pointer is in the lower zone of `row`.
    #[must_use]
    pub fn below(row: impl Into<RowId>) -> Self {
        Self {
            touching_above: None,
            touching_below: Some(row.into()),
        }
    }

    /// Both zones fired (overlapping hit areas).
    #[must_use]
    pub fn both(above: impl Into<RowId>, below: impl Into<RowId>) -> Self {
        Self {
            touching_above: Some(above.into()),
            touching_below: Some(below.into()),
        }
    }

    /// True when neither zone fired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.touching_above.is_none() && self.touching_below.is_none()
    }
}

/// Hit-testing capability the host provides.
pub trait PositionSensor {
    /// Row directly under the pointer, used to pick the drag source.
    fn row_at(&self, position: PointerPosition) -> Option<RowId>;

    /// Above/below candidates for the current pointer position.
    fn sense(&self, position: PointerPosition) -> SensorHit;
}

/// Geometry of a uniform row stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowStripConfig {
    /// Y coordinate of the first row's top edge.
    pub top: i32,
    /// Height of every row in pixels (values below 1 are treated as 1).
    pub row_height: u32,
}

impl Default for RowStripConfig {
    fn default() -> Self {
        Self {
            top: 0,
            row_height: 30,
        }
    }
}

/// Reference sensor for a vertical stack of equally tall rows.
///
/// The row order must be refreshed with [`set_rows`](RowStrip::set_rows)
/// whenever the list is re-rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowStrip {
    config: RowStripConfig,
    rows: Vec<RowId>,
}

impl RowStrip {
    #[must_use]
    pub fn new(config: RowStripConfig, rows: Vec<RowId>) -> Self {
        Self { config, rows }
    }

    /// Replace the displayed row order.
    pub fn set_rows(&mut self, rows: Vec<RowId>) {
        self.rows = rows;
    }

    #[must_use]
    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    #[must_use]
    pub const fn config(&self) -> RowStripConfig {
        self.config
    }

    /// Y coordinate of the top edge of the row at `index`.
    #[must_use]
    pub fn row_top(&self, index: usize) -> i64 {
        i64::from(self.config.top) + index as i64 * i64::from(self.height())
    }

    fn height(&self) -> u32 {
        self.config.row_height.max(1)
    }

    /// `(row index, pointer in upper half)` for `y`, clamped to the strip.
    fn locate(&self, y: i32) -> Option<(usize, bool)> {
        let last = self.rows.len().checked_sub(1)?;
        let height = i64::from(self.height());
        let offset = i64::from(y) - i64::from(self.config.top);
        if offset < 0 {
            return Some((0, true));
        }
        let index = usize::try_from(offset / height).unwrap_or(usize::MAX);
        if index > last {
            return Some((last, false));
        }
        let within = offset % height;
        Some((index, within * 2 < height))
    }
}

impl PositionSensor for RowStrip {
    fn row_at(&self, position: PointerPosition) -> Option<RowId> {
        let offset = i64::from(position.y) - i64::from(self.config.top);
        if offset < 0 {
            return None;
        }
        let index = usize::try_from(offset / i64::from(self.height())).ok()?;
        self.rows.get(index).cloned()
    }

    fn sense(&self, position: PointerPosition) -> SensorHit {
        match self.locate(position.y) {
            Some((index, true)) => SensorHit::above(self.rows[index].clone()),
            Some((index, false)) => SensorHit::below(self.rows[index].clone()),
            None => SensorHit::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> RowStrip {
        RowStrip::new(
            RowStripConfig {
                top: 100,
                row_height: 20,
            },
            vec!["a".into(), "b".into(), "c".into()],
        )
    }

    fn at(y: i32) -> PointerPosition {
        PointerPosition::new(0, y)
    }

    #[test]
    fn upper_half_touches_above() {
        assert_eq!(strip().sense(at(121)), SensorHit::above("b"));
    }

    #[test]
    fn lower_half_touches_below() {
        assert_eq!(strip().sense(at(131)), SensorHit::below("b"));
    }

    #[test]
    fn midpoint_belongs_to_lower_half() {
        assert_eq!(strip().sense(at(110)), SensorHit::below("a"));
        assert_eq!(strip().sense(at(109)), SensorHit::above("a"));
    }

    #[test]
    fn above_strip_clamps_to_first_row() {
        assert_eq!(strip().sense(at(-500)), SensorHit::above("a"));
    }

    #[test]
    fn below_strip_clamps_to_last_row() {
        assert_eq!(strip().sense(at(10_000)), SensorHit::below("c"));
    }

    #[test]
    fn empty_strip_senses_nothing() {
        let empty = RowStrip::new(RowStripConfig::default(), Vec::new());
        assert!(empty.sense(at(0)).is_empty());
        assert_eq!(empty.row_at(at(0)), None);
    }

    #[test]
    fn row_at_is_exact_not_clamped() {
        let s = strip();
        assert_eq!(s.row_at(at(99)), None);
        assert_eq!(s.row_at(at(100)), Some("a".into()));
        assert_eq!(s.row_at(at(159)), Some("c".into()));
        assert_eq!(s.row_at(at(160)), None);
    }

    #[test]
    fn zero_height_is_treated_as_one_pixel() {
        let s = RowStrip::new(
            RowStripConfig {
                top: 0,
                row_height: 0,
            },
            vec!["a".into(), "b".into()],
        );
        assert_eq!(s.row_at(at(1)), Some("b".into()));
        assert_eq!(s.row_top(1), 1);
    }

    #[test]
    fn set_rows_replaces_order() {
        let mut s = strip();
        s.set_rows(vec!["c".into(), "a".into()]);
        assert_eq!(s.sense(at(101)), SensorHit::above("c"));
        assert_eq!(s.rows().len(), 2);
    }
}
