//! # ec-api
//!
//! HTTP surface for the Examcast engine: ability estimation (single and
//! batch), pass-probability forecasting, bank analysis, and bank reload.
//!
//! The calibrated bank, topic map, and response index are published as one
//! immutable snapshot; reload swaps the snapshot atomically so requests
//! never observe a half-updated view.

pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_helpers;

pub use error::{ApiError, ErrorResponse};
pub use server::{build_router, serve};
pub use state::{load_snapshot, AppState, DataPaths, ReloadStats, Snapshot};
