//! Tail probabilities for the sum of independent Bernoulli trials.

use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

/// Standard normal CDF via the complementary error function.
///
/// Accurate to well below 1e-7 across the z range the forecaster produces.
pub fn std_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

/// Probability mass function of the Poisson-binomial distribution.
///
/// One-dimensional dynamic programming: `f[k]` is the probability of
/// exactly `k` successes after folding in each trial. Plain doubles carry
/// enough precision for the exam sizes the exact path handles.
pub fn poisson_binomial_pmf(probs: &[f64]) -> Vec<f64> {
    let n = probs.len();
    let mut f = vec![0.0; n + 1];
    f[0] = 1.0;

    for (m, &p) in probs.iter().enumerate() {
        // Walk k downwards so f[k-1] still holds the previous round's value.
        for k in (0..=m + 1).rev() {
            let carry = if k > 0 { f[k - 1] * p } else { 0.0 };
            f[k] = f[k] * (1.0 - p) + carry;
        }
    }

    f
}

/// Exact tail `Pr[X >= k]` of the Poisson-binomial distribution.
pub fn poisson_binomial_tail(probs: &[f64], k: usize) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if k > probs.len() {
        return 0.0;
    }
    let pmf = poisson_binomial_pmf(probs);
    pmf[k..].iter().sum::<f64>().clamp(0.0, 1.0)
}

/// Normal-approximation tail `Pr[X >= k]` with continuity correction.
///
/// Degenerate distributions (zero variance) collapse to a step function on
/// the mean.
pub fn normal_approx_tail(probs: &[f64], k: usize) -> f64 {
    let mean: f64 = probs.iter().sum();
    let variance: f64 = probs.iter().map(|p| p * (1.0 - p)).sum();

    if variance <= 0.0 {
        return if mean >= k as f64 { 1.0 } else { 0.0 };
    }

    let z = (k as f64 - 0.5 - mean) / variance.sqrt();
    (1.0 - std_normal_cdf(z)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Binomial tail by direct summation, for cross-checking.
    fn binomial_tail(n: usize, p: f64, k: usize) -> f64 {
        let mut total = 0.0;
        for j in k..=n {
            let mut coeff = 1.0;
            for i in 0..j {
                coeff = coeff * (n - i) as f64 / (i + 1) as f64;
            }
            total += coeff * p.powi(j as i32) * (1.0 - p).powi((n - j) as i32);
        }
        total
    }

    #[test]
    fn test_std_normal_cdf_reference_values() {
        assert!((std_normal_cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((std_normal_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((std_normal_cdf(-1.96) - 0.025).abs() < 1e-3);
        assert!(std_normal_cdf(10.0) > 1.0 - 1e-7);
        assert!(std_normal_cdf(-10.0) < 1e-7);
    }

    #[test]
    fn test_pmf_sums_to_one() {
        let probs: Vec<f64> = (0..30).map(|i| 0.2 + 0.02 * i as f64).collect();
        let pmf = poisson_binomial_pmf(&probs);
        let total: f64 = pmf.iter().sum();
        assert!(
            (total - 1.0).abs() < 1e-9,
            "pmf mass should be 1, got {}",
            total
        );
    }

    #[test]
    fn test_pmf_single_trial() {
        let pmf = poisson_binomial_pmf(&[0.3]);
        assert!((pmf[0] - 0.7).abs() < 1e-12);
        assert!((pmf[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_tail_matches_binomial_for_equal_probs() {
        // 10 trials at p = 0.6, at least 7 successes: ~0.38228
        let probs = vec![0.6; 10];
        let tail = poisson_binomial_tail(&probs, 7);
        let expected = binomial_tail(10, 0.6, 7);
        assert!(
            (tail - expected).abs() < 1e-12,
            "got {}, expected {}",
            tail,
            expected
        );
        assert!((tail - 0.38228).abs() < 1e-4);
    }

    #[test]
    fn test_tail_at_zero_is_one() {
        assert_eq!(poisson_binomial_tail(&[0.1, 0.9], 0), 1.0);
    }

    #[test]
    fn test_tail_beyond_n_is_zero() {
        assert_eq!(poisson_binomial_tail(&[0.5, 0.5], 3), 0.0);
    }

    #[test]
    fn test_certain_items_give_certain_tail() {
        let probs = vec![1.0; 8];
        assert!((poisson_binomial_tail(&probs, 8) - 1.0).abs() < 1e-12);
        let probs = vec![0.0; 8];
        assert_eq!(poisson_binomial_tail(&probs, 1), 0.0);
    }

    #[test]
    fn test_normal_approx_degenerate_variance() {
        assert_eq!(normal_approx_tail(&[1.0; 40], 40), 1.0);
        assert_eq!(normal_approx_tail(&[0.0; 40], 1), 0.0);
    }

    #[test]
    fn test_normal_approx_reference_value() {
        // 100 items at p = 0.7, threshold 70: z = -0.5/sqrt(21) ~ -0.109,
        // tail ~ 0.5434
        let probs = vec![0.7; 100];
        let tail = normal_approx_tail(&probs, 70);
        assert!((tail - 0.5434).abs() < 1e-3, "got {}", tail);
    }

    #[test]
    fn test_exact_and_normal_agree_at_the_crossover() {
        // At the exact-path boundary the two methods should be within two
        // percentage points for mid-range probabilities.
        let probs: Vec<f64> = (0..30).map(|i| 0.2 + 0.6 * (i as f64 / 29.0)).collect();
        for k in [12usize, 15, 18] {
            let exact = poisson_binomial_tail(&probs, k);
            let approx = normal_approx_tail(&probs, k);
            assert!(
                (exact - approx).abs() < 0.02,
                "k = {}: exact {} vs normal {}",
                k,
                exact,
                approx
            );
        }
    }
}
