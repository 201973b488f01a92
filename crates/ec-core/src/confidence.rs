//! Forecast confidence aggregation.
//!
//! Blends three signals into a single score: how confident the ability
//! estimate itself is, whether the exam is large enough to average out item
//! noise, and how tightly the per-item probabilities cluster. The weights
//! are fixed; they are part of the forecast contract, not a tunable.

/// Exam sizes at or above this count saturate the sample-adequacy signal.
const FULL_SAMPLE_SIZE: f64 = 50.0;

/// Aggregates ability, sample-size, and spread signals into `[0, 1]`.
pub fn aggregate_confidence(ability_confidence: f64, per_item_probabilities: &[f64]) -> f64 {
    let n = per_item_probabilities.len();
    if n == 0 {
        return 0.0;
    }

    let num_conf = (n as f64 / FULL_SAMPLE_SIZE).min(1.0);

    let mean = per_item_probabilities.iter().sum::<f64>() / n as f64;
    let variance = per_item_probabilities
        .iter()
        .map(|p| (p - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    let variance_conf = 1.0 - (variance * 4.0).min(1.0);

    (0.5 * ability_confidence + 0.3 * num_conf + 0.2 * variance_conf).clamp(0.0, 1.0)
}
