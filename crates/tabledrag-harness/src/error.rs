use std::path::PathBuf;

use tabledrag::{ConstructionError, EngineError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid row list: {0}")]
    Construction(#[from] ConstructionError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("invalid scenario: {message}")]
    Scenario { message: String },

    #[error("row list rejected by {vetoes} veto(es)")]
    CheckFailed { vetoes: usize },
}

impl HarnessError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CheckFailed { .. } => 2,
            Self::Construction(_) | Self::Scenario { .. } => 3,
            _ => 1,
        }
    }

    #[must_use]
    pub fn scenario(message: impl Into<String>) -> Self {
        Self::Scenario {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HarnessError;
    use tabledrag::ConstructionError;

    #[test]
    fn check_failure_has_its_own_exit_code() {
        let error = HarnessError::CheckFailed { vetoes: 2 };
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.to_string(), "row list rejected by 2 veto(es)");
    }

    #[test]
    fn construction_errors_are_input_errors() {
        let error = HarnessError::from(ConstructionError::FirstRowNotRoot { depth: 1 });
        assert_eq!(error.exit_code(), 3);
        assert_eq!(
            error.to_string(),
            "invalid row list: first row has depth 1, expected 0"
        );
    }

    #[test]
    fn io_errors_default_to_one() {
        let error = HarnessError::from(std::io::Error::other("disk"));
        assert_eq!(error.exit_code(), 1);
    }
}
