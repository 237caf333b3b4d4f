//! Monitoring Module
//!
//! Structured logging through `tracing`.

pub mod logging;

pub use logging::{init_logging, LogFormat, LogLevel, LoggerConfig};
