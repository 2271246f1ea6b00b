//! Error types for u-capmatch.
//!
//! Only structural problems are errors. Unparseable requirement strings
//! and bounds are recovered where they occur, and an unsatisfiable or
//! timed-out solve is a [`MatchOutcome`](crate::engine::MatchOutcome),
//! not an error.

use thiserror::Error;

use crate::cp::ModelStage;
use crate::validation::ValidationError;

/// Main error type for matching operations.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Input failed integrity checks.
    #[error("Invalid input: {}", summarize(.0))]
    InvalidInput(Vec<ValidationError>),

    /// A model operation was called in the wrong build stage.
    #[error("Invalid model stage for {operation}: expected {expected:?}, found {found:?}")]
    InvalidStage {
        operation: &'static str,
        expected: ModelStage,
        found: ModelStage,
    },

    /// A constraint referenced a variable that does not exist.
    #[error("Unknown selection variable {0}")]
    UnknownVariable(usize),

    /// Error raised by a solving backend, with the stage it occurred in.
    #[error("Oracle error during {stage}: {message}")]
    Oracle {
        stage: &'static str,
        message: String,
    },
}

/// Result type alias for matching operations.
pub type Result<T> = std::result::Result<T, MatchError>;

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
