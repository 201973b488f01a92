//! Exam pass-probability forecasting.
//!
//! Given an ability estimate and an exam composition, predicts the
//! distribution of the total correct count. Small exams use the exact
//! Poisson-binomial distribution computed by dynamic programming; larger
//! exams use a normal approximation with continuity correction.

mod forecast;
mod service;
mod tail;

pub use forecast::{ExamForecaster, ExamItem, ExamSpec, PassForecast};
pub use service::{ExamSummary, ForecastOutcome, ForecastService, TopicAnswerStats};
pub use tail::{normal_approx_tail, poisson_binomial_pmf, poisson_binomial_tail, std_normal_cdf};
