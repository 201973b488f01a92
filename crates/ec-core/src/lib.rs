//! # ec-core
//!
//! The Examcast psychometric engine: item difficulty calibration, learner
//! ability estimation, and exam pass-probability forecasting on a
//! three-parameter logistic (3PL) item response model.
//!
//! The engine is purely computational and stateless per call. The item bank
//! is calibrated once from the full response history and read-only
//! afterwards; estimator and forecaster calls are independent and safe to
//! run in parallel against a shared bank. All I/O (response history, topic
//! mapping) happens in the surrounding crates before the engine runs.

pub mod ability;
pub mod analysis;
pub mod bank;
pub mod calibration;
pub mod confidence;
pub mod config;
pub mod error;
pub mod irt;
pub mod model;
pub mod prediction;
pub mod selection;

pub use ability::{
    AbilityEstimator, LearnerAbilityOutcome, LearnerResponses, TopicAbilityProfile,
};
pub use analysis::{
    BankAnalysis, DifficultyBands, DifficultyStats, DiscriminationStats, TopicCount,
    TopicDistribution,
};
pub use bank::{ItemBank, TopicAssignment, TopicKind, TopicMap, TopicMeta};
pub use calibration::{BankCalibrator, CalibrationReport};
pub use config::EngineConfig;
pub use confidence::aggregate_confidence;
pub use error::{EngineError, EngineResult};
pub use model::{AbilityEstimate, Item, ItemParams, ItemStats, Response};
pub use prediction::{
    ExamForecaster, ExamItem, ExamSpec, ExamSummary, ForecastOutcome, ForecastService,
    PassForecast, TopicAnswerStats,
};
pub use selection::{DifficultyCounts, TopicStructure};
