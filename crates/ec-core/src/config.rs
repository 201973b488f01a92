//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Tunable parameters of the psychometric engine.
///
/// All fields have production defaults; construct with `EngineConfig::default()`
/// and override selectively. `validate()` rejects combinations the estimator
/// cannot operate under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum Newton-Raphson iterations per ability estimation.
    pub newton_max_iter: usize,
    /// Convergence tolerance on the ability update step.
    pub newton_tol: f64,
    /// Exam sizes up to this bound use the exact Poisson-binomial DP;
    /// larger exams use the normal approximation.
    pub exact_dp_threshold: usize,
    /// Weight of the accuracy signal in difficulty calibration.
    pub accuracy_weight: f64,
    /// Weight of the response-time signal in difficulty calibration.
    pub time_weight: f64,
    /// Discrimination assigned to items without an override.
    pub default_discrimination: f64,
    /// Guessing parameter assigned to items without an override.
    pub default_guessing: f64,
    /// Ability and difficulty are clamped to `[-ability_clip, +ability_clip]`.
    pub ability_clip: f64,
    /// Minimum responses a topic group needs before a per-topic ability is
    /// reported. Groups below this are omitted from the output.
    pub min_topic_responses: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            newton_max_iter: 10,
            newton_tol: 1e-3,
            exact_dp_threshold: 30,
            accuracy_weight: 0.6,
            time_weight: 0.4,
            default_discrimination: 1.0,
            default_guessing: 0.25,
            ability_clip: 3.0,
            min_topic_responses: 1,
        }
    }
}

impl EngineConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.newton_max_iter == 0 {
            return Err(EngineError::InvalidConfig(
                "newton_max_iter must be at least 1".into(),
            ));
        }
        if !(self.newton_tol > 0.0) {
            return Err(EngineError::InvalidConfig(
                "newton_tol must be positive".into(),
            ));
        }
        if self.accuracy_weight < 0.0 || self.time_weight < 0.0 {
            return Err(EngineError::InvalidConfig(
                "calibration weights must be non-negative".into(),
            ));
        }
        let total = self.accuracy_weight + self.time_weight;
        if (total - 1.0).abs() > 0.01 {
            return Err(EngineError::InvalidConfig(format!(
                "calibration weights must sum to approximately 1.0, got {}",
                total
            )));
        }
        if !(self.default_discrimination > 0.0) {
            return Err(EngineError::InvalidConfig(
                "default_discrimination must be positive".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.default_guessing) {
            return Err(EngineError::InvalidConfig(format!(
                "default_guessing must lie in [0, 1), got {}",
                self.default_guessing
            )));
        }
        if !(self.ability_clip > 0.0) {
            return Err(EngineError::InvalidConfig(
                "ability_clip must be positive".into(),
            ));
        }
        Ok(())
    }
}
