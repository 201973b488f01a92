//! Loader errors.

use thiserror::Error;

/// Errors raised while loading the flat data files.
///
/// Only structural failures surface here (unreadable file, invalid JSON
/// document, unusable header). Individually malformed records are dropped
/// and counted instead.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("response history is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("topic mapping file is empty")]
    EmptyTopicFile,

    #[error("topic mapping header is missing the {0} column")]
    MissingColumn(&'static str),
}
