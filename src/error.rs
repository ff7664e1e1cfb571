//! Engine error types.
//!
//! Unmet quotas are not errors: they degrade the run to a partial
//! timetable and are reported in its [`CompletenessReport`]. The
//! variants here are the conditions that stop a run.
//!
//! [`CompletenessReport`]: crate::models::CompletenessReport

use std::time::Duration;

use thiserror::Error;

use crate::models::Violation;
use crate::validation::ValidationError;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by a generation run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The snapshot, grid, or room pool is empty or inconsistent.
    /// Raised before any placement is attempted.
    #[error("invalid input ({} problem(s)): {}", .0.len(), summarize(.0))]
    Input(Vec<ValidationError>),

    /// The final audit found an invariant breach in a produced timetable.
    /// This is an engine defect, not a property of the input.
    #[error("engine defect: generated timetable failed audit with {} violation(s): {}", .0.len(), first_violation(.0))]
    ValidatorViolation(Vec<Violation>),

    /// Engine configuration is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Engine configuration could not be parsed.
    #[error("configuration parse failed: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The run observed its cancellation token.
    #[error("generation cancelled")]
    Cancelled,

    /// The worker did not finish within the deadline.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    /// The worker task panicked or was aborted.
    #[error("generation worker failed: {0}")]
    Worker(String),
}

impl EngineError {
    /// Whether the error signals an engine bug rather than bad input.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::ValidatorViolation(_) | Self::Worker(_))
    }

    /// Validation problems carried by an input error.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Input(errors) => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn first_violation(violations: &[Violation]) -> &str {
    violations.first().map(|v| v.message.as_str()).unwrap_or("")
}
