#![forbid(unsafe_code)]

//! Stable row identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for one displayed row.
///
/// Assigned once when the engine attaches to a list and never changed
/// afterwards. Equality is the only meaningful operation; ordering exists so
/// ids can key deterministic maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the raw identifier.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for RowId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for RowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_value() {
        assert_eq!(RowId::from("row-7").to_string(), "row-7");
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&RowId::new("a")).expect("serialize");
        assert_eq!(json, "\"a\"");
        let back: RowId = serde_json::from_str("\"b\"").expect("deserialize");
        assert_eq!(back.as_str(), "b");
    }
}
