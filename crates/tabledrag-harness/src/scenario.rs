//! Scenario and row-list files.
//!
//! A scenario is a JSON object:
//!
//! ```json
//! {
//!   "config":  { "nesting_drag_distance": 40, "validators": [{"validator": "shape"}] },
//!   "gesture": { "drag_threshold": 3 },
//!   "strip":   { "top": 0, "row_height": 30 },
//!   "rows":    [{ "id": "a", "depth": 0 }, { "id": "b", "depth": 1 }],
//!   "events":  [{ "kind": "down", "position": { "x": 5, "y": 40 } }]
//! }
//! ```
//!
//! Every section is optional. A row list is a JSON array of attribute
//! objects, read through a [`RowConnector`]; numbers and booleans are taken
//! as their JSON text so `{"depth": 1}` and `{"depth": "1"}` mean the same.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabledrag::{EngineConfig, RowConnector, RowSpec, parse_rows};
use tabledrag_core::{GestureConfig, PointerEvent, RowStripConfig};

use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: EngineConfig,
    pub gesture: GestureConfig,
    pub strip: RowStripConfig,
    pub rows: Vec<RowSpec>,
    pub events: Vec<PointerEvent>,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(text)?;
        if scenario.rows.is_empty() {
            return Err(HarnessError::scenario("scenario has no rows"));
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&read(path)?)
    }
}

pub(crate) fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| HarnessError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn attribute_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Parse a JSON array of attribute objects into row specs.
pub fn rows_from_json<C: RowConnector + ?Sized>(connector: &C, text: &str) -> Result<Vec<RowSpec>> {
    let raw: Vec<BTreeMap<String, Value>> = serde_json::from_str(text)?;
    let maps: Vec<BTreeMap<String, String>> = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .filter_map(|(key, value)| attribute_text(value).map(|text| (key, text)))
                .collect()
        })
        .collect();
    Ok(parse_rows(connector, &maps)?)
}

pub fn load_rows<C: RowConnector + ?Sized>(connector: &C, path: &Path) -> Result<Vec<RowSpec>> {
    rows_from_json(connector, &read(path)?)
}

pub fn load_config(path: &Path) -> Result<EngineConfig> {
    Ok(serde_json::from_str(&read(path)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabledrag::{AttributesConnector, ValidatorConfig};
    use tabledrag_core::PointerEventKind;

    #[test]
    fn minimal_scenario_uses_defaults() {
        let scenario = Scenario::from_json(r#"{"rows":[{"id":"a"}]}"#).expect("scenario");
        assert_eq!(scenario.config, EngineConfig::default());
        assert_eq!(scenario.gesture, GestureConfig::default());
        assert_eq!(scenario.strip.row_height, 30);
        assert!(scenario.events.is_empty());
    }

    #[test]
    fn full_scenario_parses() {
        let scenario = Scenario::from_json(
            r#"{
                "config": {"nesting_drag_distance": 20,
                           "validators": [{"validator": "shape"}, {"validator": "max_depth", "max": 1}]},
                "gesture": {"drag_threshold": 0},
                "strip": {"top": 10, "row_height": 20},
                "rows": [{"id": "a"}, {"id": "b"}],
                "events": [
                    {"kind": "down", "position": {"x": 0, "y": 15}},
                    {"kind": "move", "pointer_id": 0, "position": {"x": 0, "y": 55}},
                    {"kind": "up", "position": {"x": 0, "y": 55}}
                ]
            }"#,
        )
        .expect("scenario");
        assert_eq!(scenario.config.nesting_drag_distance, 20);
        assert_eq!(scenario.config.validators[1], ValidatorConfig::MaxDepth { max: 1 });
        assert_eq!(scenario.strip.top, 10);
        assert_eq!(scenario.events[1].kind, PointerEventKind::Move);
    }

    #[test]
    fn scenario_without_rows_is_rejected() {
        let err = Scenario::from_json("{}").expect_err("no rows");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn row_attributes_accept_numbers_and_strings() {
        let rows = rows_from_json(
            &AttributesConnector::default(),
            r#"[{"id": "a", "depth": 0, "weight": "4"}, {"id": "b", "depth": "1", "weight": 9, "title": null}]"#,
        )
        .expect("rows");
        assert_eq!(rows[0].weight, Some(4));
        assert_eq!(rows[1].depth, Some(1));
        assert!(rows[1].payload.is_empty());
    }

    #[test]
    fn malformed_attribute_is_a_construction_error() {
        let err = rows_from_json(&AttributesConnector::default(), r#"[{"depth": "x"}]"#)
            .expect_err("malformed");
        assert!(matches!(err, HarnessError::Construction(_)));
    }
}
