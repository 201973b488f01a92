//! # ec-observability
//!
//! Structured logging for the Examcast services, built on the tracing
//! ecosystem.

mod logging;

pub use logging::{init_logging, init_logging_with_config, LoggingConfig};
