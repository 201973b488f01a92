//! Engine error taxonomy.
//!
//! Every fatal engine error maps to a stable kind code so callers (the HTTP
//! surface, the batch operation) can report failures in-band without string
//! matching on messages.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the psychometric engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The learner has no responses in the requested scope.
    #[error("no responses available for learner {0}")]
    NoResponses(String),

    /// A response references an item that is not in the calibrated bank.
    #[error("item {0} is not in the calibrated bank")]
    UnknownItem(String),

    /// Newton-Raphson produced non-finite values twice.
    #[error("ability estimation became numerically unstable for learner {0}")]
    NumericInstability(String),

    /// An exam with zero items was submitted for forecasting.
    #[error("exam contains no items")]
    EmptyExam,

    /// The passing threshold lies outside (0, 1].
    #[error("passing threshold {0} is outside (0, 1]")]
    InvalidThreshold(f64),

    /// Engine configuration failed validation.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Returns the stable kind code for this error.
    pub fn kind_code(&self) -> &'static str {
        match self {
            EngineError::NoResponses(_) => "NO_RESPONSES",
            EngineError::UnknownItem(_) => "UNKNOWN_ITEM",
            EngineError::NumericInstability(_) => "NUMERIC_INSTABILITY",
            EngineError::EmptyExam => "EMPTY_EXAM",
            EngineError::InvalidThreshold(_) => "INVALID_THRESHOLD",
            EngineError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}
