//! The three-parameter logistic (3PL) item response model.
//!
//! `P(theta) = c + (1 - c) / (1 + exp(-a * (theta - b)))`
//!
//! Probability and Fisher information are closed-form; both are evaluated
//! through a branch-wise sigmoid that stays finite for any argument.

use crate::model::ItemParams;

/// Sigmoid function with numerical stability.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let exp_x = x.exp();
        exp_x / (1.0 + exp_x)
    }
}

/// Probability of a correct answer under the 3PL model.
///
/// Strictly increasing in `theta`, with range `(c, 1)`; the result is
/// clamped to `[0, 1]` against floating-point drift.
pub fn probability(theta: f64, params: &ItemParams) -> f64 {
    let z = params.discrimination * (theta - params.difficulty);
    let p = params.guessing + (1.0 - params.guessing) * sigmoid(z);
    p.clamp(0.0, 1.0)
}

/// Fisher information an item contributes at ability `theta`.
///
/// `I(theta) = a^2 * (P - c)^2 * (1 - P) / ((1 - c)^2 * P)`
///
/// Items are most informative when their difficulty sits near `theta`.
/// Degenerate probabilities (at or below the guessing floor, or at 1)
/// contribute nothing.
pub fn information(theta: f64, params: &ItemParams) -> f64 {
    let p = probability(theta, params);
    let c = params.guessing;

    if p <= c || p >= 1.0 {
        return 0.0;
    }

    let numerator = params.discrimination.powi(2) * (p - c).powi(2) * (1.0 - p);
    let denominator = (1.0 - c).powi(2) * p;

    if denominator > 0.0 {
        (numerator / denominator).max(0.0)
    } else {
        0.0
    }
}
