//! Core data models: responses, item parameters, and ability estimates.

use serde::{Deserialize, Serialize};

/// A single recorded answer to an item.
///
/// Duplicate (learner, item) pairs are permitted; each response contributes
/// independently to the likelihood. Ordering carries no meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// The item that was answered.
    pub item_id: String,
    /// Whether the answer was correct.
    pub correct: bool,
    /// Time taken to answer, in seconds.
    pub response_time_secs: f64,
    /// Unix timestamp of the answer (milliseconds; 0 when unknown).
    #[serde(default)]
    pub timestamp: i64,
}

impl Response {
    /// Creates a response with an unknown timestamp.
    pub fn new(item_id: impl Into<String>, correct: bool, response_time_secs: f64) -> Self {
        Self {
            item_id: item_id.into(),
            correct,
            response_time_secs,
            timestamp: 0,
        }
    }

    /// Returns true when the record carries usable values.
    ///
    /// A malformed response (empty item id, negative or non-finite time) is
    /// dropped by the calibrator rather than propagated as an error.
    pub fn is_well_formed(&self) -> bool {
        !self.item_id.is_empty()
            && self.response_time_secs.is_finite()
            && self.response_time_secs >= 0.0
    }
}

/// The three parameters of the logistic item response curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ItemParams {
    /// Difficulty `b` on the standard-normal scale, clamped to `[-3, +3]`.
    pub difficulty: f64,
    /// Discrimination `a`, the slope of the curve at `theta = b`.
    pub discrimination: f64,
    /// Guessing parameter `c`, the lower asymptote of the curve.
    pub guessing: f64,
}

impl ItemParams {
    /// Creates parameters with the given difficulty and default slope/asymptote.
    pub fn with_difficulty(difficulty: f64) -> Self {
        Self {
            difficulty,
            discrimination: 1.0,
            guessing: 0.25,
        }
    }
}

impl Default for ItemParams {
    fn default() -> Self {
        Self {
            difficulty: 0.0,
            discrimination: 1.0,
            guessing: 0.25,
        }
    }
}

/// Aggregate response statistics for one item, used during calibration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemStats {
    /// Number of recorded attempts.
    pub attempt_count: usize,
    /// Number of correct attempts.
    pub correct_count: usize,
    /// Mean response time in seconds over timed attempts, if any.
    pub mean_response_time: Option<f64>,
}

impl ItemStats {
    /// Fraction of attempts answered correctly.
    pub fn accuracy(&self) -> f64 {
        if self.attempt_count == 0 {
            return 0.0;
        }
        self.correct_count as f64 / self.attempt_count as f64
    }
}

/// A calibrated item in the bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier (opaque; assigned by the upstream content system).
    pub id: String,
    /// Calibrated response-curve parameters.
    pub params: ItemParams,
    /// The aggregate statistics calibration was derived from.
    pub stats: ItemStats,
    /// False when the item had no attempts and received the neutral default.
    pub calibrated: bool,
}

impl Item {
    /// Creates an uncalibrated placeholder with neutral difficulty.
    pub fn uncalibrated(id: impl Into<String>, params: ItemParams) -> Self {
        Self {
            id: id.into(),
            params,
            stats: ItemStats::default(),
            calibrated: false,
        }
    }
}

/// A learner ability estimate with its uncertainty.
///
/// Recomputed on demand; never persisted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityEstimate {
    /// Point estimate of ability on the standard-normal scale, in `[-3, +3]`.
    pub theta: f64,
    /// Standard error of the estimate, `1 / sqrt(I(theta))`.
    pub standard_error: f64,
    /// Confidence in `(0, 1]`, monotone decreasing in the standard error.
    pub confidence: f64,
    /// Number of responses the estimate was computed from.
    pub num_responses: usize,
}
