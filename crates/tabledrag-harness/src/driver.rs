//! Replays a [`Scenario`] through recognizer, sensor, and engine.
//!
//! Raw pointer events go through [`DragRecognizer`]; its signals become the
//! engine's `on_drag_start` / `on_drag_over` / `on_drag_end` calls, with a
//! [`RowStrip`] standing in for the host layout. The strip is refreshed after
//! every commit so hit-testing follows the re-rendered order.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use tabledrag::{DragOverOutcome, GestureSummary, Node, TableDrag};
use tabledrag_core::{
    DragRecognizer, DragSignal, PointerEvent, PointerPosition, PositionSensor, RowId, RowStrip,
    SensorHit,
};

use crate::error::Result;
use crate::scenario::Scenario;

/// One engine interaction produced by the replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Drag started over a row.
    Started {
        row: RowId,
        origin: PointerPosition,
        start_depth: u32,
        children: usize,
    },
    /// Drag started outside every row; the gesture is ignored.
    Missed { origin: PointerPosition },
    /// Pointer update forwarded to the engine.
    Over {
        position: PointerPosition,
        hit: SensorHit,
        outcome: DragOverOutcome,
    },
    /// Gesture finished or was canceled.
    Finished { summary: GestureSummary },
}

/// Replay result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub steps: Vec<Step>,
    pub gestures: usize,
    /// Row order after each commit, as listeners observed it.
    pub frames: Vec<Vec<RowId>>,
    pub rows: Vec<Node>,
    pub state_hash: u64,
}

impl Report {
    #[must_use]
    pub fn commits(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn rejections(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| {
                matches!(
                    step,
                    Step::Over {
                        outcome: DragOverOutcome::Rejected { .. },
                        ..
                    }
                )
            })
            .count()
    }
}

/// Drives one engine from pointer events.
#[derive(Debug)]
pub struct Driver {
    engine: TableDrag,
    recognizer: DragRecognizer,
    strip: RowStrip,
    frames: Rc<RefCell<Vec<Vec<RowId>>>>,
    steps: Vec<Step>,
    gestures: usize,
    // Set when a drag started outside every row; its signals are dropped.
    ignoring: bool,
}

impl Driver {
    pub fn new(scenario: &Scenario) -> Result<Self> {
        let mut engine = TableDrag::new(scenario.rows.clone(), &scenario.config)?;
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&frames);
        engine.on_change(move |sequence| sink.borrow_mut().push(sequence.ids()));
        let strip = RowStrip::new(scenario.strip, engine.sequence().ids());
        Ok(Self {
            engine,
            recognizer: DragRecognizer::new(scenario.gesture.clone()),
            strip,
            frames,
            steps: Vec::new(),
            gestures: 0,
            ignoring: false,
        })
    }

    #[must_use]
    pub fn engine(&self) -> &TableDrag {
        &self.engine
    }

    pub fn feed(&mut self, event: &PointerEvent) -> Result<()> {
        for signal in self.recognizer.process(event) {
            self.dispatch(signal)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, signal: DragSignal) -> Result<()> {
        match signal {
            DragSignal::Start { origin, .. } => {
                let Some(row) = self.strip.row_at(origin) else {
                    tracing::debug!(x = origin.x, y = origin.y, "drag started outside rows");
                    self.ignoring = true;
                    self.steps.push(Step::Missed { origin });
                    return Ok(());
                };
                self.ignoring = false;
                let anchor = self.engine.on_drag_start(&row, origin.x)?;
                self.gestures += 1;
                self.steps.push(Step::Started {
                    row,
                    origin,
                    start_depth: anchor.start_depth(),
                    children: anchor.children().len(),
                });
            }
            DragSignal::Move { current, .. } => {
                if self.ignoring {
                    return Ok(());
                }
                let hit = self.strip.sense(current);
                let outcome = self.engine.on_drag_over(current.x, current.y, &hit)?;
                if outcome.is_committed() {
                    self.strip.set_rows(self.engine.sequence().ids());
                }
                self.steps.push(Step::Over {
                    position: current,
                    hit,
                    outcome,
                });
            }
            DragSignal::End { .. } => self.finish(false),
            DragSignal::Cancel => self.finish(true),
        }
        Ok(())
    }

    fn finish(&mut self, canceled: bool) {
        if std::mem::take(&mut self.ignoring) {
            return;
        }
        let summary = if canceled {
            self.engine.on_drag_cancel()
        } else {
            self.engine.on_drag_end()
        };
        if let Some(summary) = summary {
            self.steps.push(Step::Finished { summary });
        }
    }

    #[must_use]
    pub fn into_report(self) -> Report {
        let frames = self.frames.borrow().clone();
        Report {
            steps: self.steps,
            gestures: self.gestures,
            frames,
            rows: self.engine.nodes().to_vec(),
            state_hash: self.engine.sequence().state_hash(),
        }
    }
}

/// Replay every event of `scenario` and report.
pub fn replay(scenario: &Scenario) -> Result<Report> {
    let mut driver = Driver::new(scenario)?;
    for event in &scenario.events {
        driver.feed(event)?;
    }
    Ok(driver.into_report())
}
