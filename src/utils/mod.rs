//! Utility modules: error types and logging helpers

pub mod error;
pub mod logging;

pub use error::{LeafscanError, Result};
pub use logging::{init_default_logging, init_logging, LogConfig, LogLevel};
