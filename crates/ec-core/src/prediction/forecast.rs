//! The exam forecaster: per-item probabilities to a pass forecast.

use serde::{Deserialize, Serialize};

use super::tail::{normal_approx_tail, poisson_binomial_tail};
use crate::confidence::aggregate_confidence;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::irt;
use crate::model::{AbilityEstimate, ItemParams};

/// One item of a prospective exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamItem {
    /// Bank id when the item comes from the bank; `None` for ad-hoc items
    /// specified directly by their parameters.
    pub item_id: Option<String>,
    pub params: ItemParams,
}

impl ExamItem {
    /// An ad-hoc exam item with the given parameters.
    pub fn ad_hoc(params: ItemParams) -> Self {
        Self {
            item_id: None,
            params,
        }
    }

    /// A bank-backed exam item.
    pub fn from_bank(item_id: impl Into<String>, params: ItemParams) -> Self {
        Self {
            item_id: Some(item_id.into()),
            params,
        }
    }
}

/// A prospective exam: ordered items plus the passing threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSpec {
    pub items: Vec<ExamItem>,
    /// Fraction of items that must be correct to pass, in `(0, 1]`.
    pub passing_threshold: f64,
    /// Total score of the exam; defaults to the item count when absent.
    #[serde(default)]
    pub total_score: Option<u32>,
}

impl ExamSpec {
    /// Minimum number of correct answers needed to pass.
    pub fn min_correct(&self) -> usize {
        (self.passing_threshold * self.items.len() as f64).ceil() as usize
    }
}

/// Forecast for one learner sitting one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassForecast {
    /// Probability of meeting the threshold, as a percentage in `[0, 100]`.
    pub pass_probability_pct: f64,
    /// Expected score as a percentage of the item count, in `[0, 100]`.
    pub expected_score_pct: f64,
    /// Aggregate forecast confidence in `[0, 1]`.
    pub confidence: f64,
    /// Per-item probabilities of a correct answer, in exam order.
    pub per_item_probabilities: Vec<f64>,
}

/// Computes pass forecasts from an ability estimate and an exam spec.
#[derive(Debug, Clone)]
pub struct ExamForecaster {
    config: EngineConfig,
}

impl ExamForecaster {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Forecasts the exam at the estimate's ability.
    pub fn forecast(
        &self,
        ability: &AbilityEstimate,
        spec: &ExamSpec,
    ) -> EngineResult<PassForecast> {
        let probs: Vec<f64> = spec
            .items
            .iter()
            .map(|item| irt::probability(ability.theta, &item.params))
            .collect();
        self.forecast_from_probabilities(probs, spec.passing_threshold, ability.confidence)
    }

    /// Forecasts from precomputed per-item probabilities.
    ///
    /// This is the shared tail computation behind both the plain and the
    /// topic-aware forecast paths.
    pub fn forecast_from_probabilities(
        &self,
        probs: Vec<f64>,
        passing_threshold: f64,
        ability_confidence: f64,
    ) -> EngineResult<PassForecast> {
        if probs.is_empty() {
            return Err(EngineError::EmptyExam);
        }
        if !(passing_threshold > 0.0 && passing_threshold <= 1.0) {
            return Err(EngineError::InvalidThreshold(passing_threshold));
        }

        let n = probs.len();
        let min_correct = (passing_threshold * n as f64).ceil() as usize;

        let pass_prob = if n <= self.config.exact_dp_threshold {
            poisson_binomial_tail(&probs, min_correct)
        } else {
            normal_approx_tail(&probs, min_correct)
        };

        let expected_correct: f64 = probs.iter().sum();
        let expected_score_pct = (expected_correct / n as f64 * 100.0).clamp(0.0, 100.0);
        let confidence = aggregate_confidence(ability_confidence, &probs);

        Ok(PassForecast {
            pass_probability_pct: (pass_prob * 100.0).clamp(0.0, 100.0),
            expected_score_pct,
            confidence,
            per_item_probabilities: probs,
        })
    }
}
