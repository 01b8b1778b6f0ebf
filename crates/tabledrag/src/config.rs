#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! All types deserialize from partial JSON: missing fields take the
//! documented defaults.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::source::ConstructionError;
use crate::validate::{
    MaxChildrenValidator, MaxDepthValidator, ShapeValidator, TypeNestingValidator,
    ValidationChain, Validator,
};

/// Pixels of horizontal travel per indent level.
pub const DEFAULT_NESTING_DRAG_DISTANCE: u32 = 40;

/// Default ceiling for the max-depth validator.
pub const DEFAULT_MAX_DEPTH: u32 = 5;

const fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

/// One built-in validator and its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "validator", rename_all = "snake_case")]
pub enum ValidatorConfig {
    Shape,
    MaxDepth {
        #[serde(default = "default_max_depth")]
        max: u32,
    },
    Types {
        /// Child kind -> allowed parent kinds.
        #[serde(default)]
        nestable: BTreeMap<String, BTreeSet<String>>,
    },
    MaxChildren {
        max: usize,
    },
}

impl ValidatorConfig {
    /// Name matching [`Validator::name`] of the built validator.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Shape => "shape",
            Self::MaxDepth { .. } => "max_depth",
            Self::Types { .. } => "types",
            Self::MaxChildren { .. } => "max_children",
        }
    }

    fn validate(&self) -> Result<(), ConstructionError> {
        match self {
            Self::MaxChildren { max: 0 } => Err(ConstructionError::InvalidValidatorConfig {
                validator: self.name(),
                reason: "max must be at least 1".to_owned(),
            }),
            _ => Ok(()),
        }
    }

    fn build(&self) -> Box<dyn Validator> {
        match self {
            Self::Shape => Box::new(ShapeValidator),
            Self::MaxDepth { max } => Box::new(MaxDepthValidator { max: *max }),
            Self::Types { nestable } => Box::new(TypeNestingValidator {
                nestable: nestable.clone(),
            }),
            Self::MaxChildren { max } => Box::new(MaxChildrenValidator { max: *max }),
        }
    }
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pixels per indent level (default: 40).
    pub nesting_drag_distance: u32,
    /// Validators in evaluation order (default: shape only).
    pub validators: Vec<ValidatorConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nesting_drag_distance: DEFAULT_NESTING_DRAG_DISTANCE,
            validators: vec![ValidatorConfig::Shape],
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_nesting_drag_distance(mut self, pixels: u32) -> Self {
        self.nesting_drag_distance = pixels;
        self
    }

    /// Replace the validator list.
    #[must_use]
    pub fn with_validators(mut self, validators: Vec<ValidatorConfig>) -> Self {
        self.validators = validators;
        self
    }

    /// Append one validator.
    #[must_use]
    pub fn with_validator(mut self, validator: ValidatorConfig) -> Self {
        self.validators.push(validator);
        self
    }

    /// Check option ranges.
    pub fn validate(&self) -> Result<(), ConstructionError> {
        if self.nesting_drag_distance == 0 {
            return Err(ConstructionError::InvalidNestingDistance);
        }
        self.validators.iter().try_for_each(ValidatorConfig::validate)
    }

    /// Build the configured chain.
    pub fn build_chain(&self) -> Result<ValidationChain, ConstructionError> {
        self.validate()?;
        let mut chain = ValidationChain::new();
        for validator in &self.validators {
            chain.push(validator.build());
        }
        Ok(chain)
    }
}
