//! # varwatch Utilities
//!
//! Shared logging setup and helpers for varwatch.
//!
//! This crate keeps the `tracing` subscriber configuration out of the core
//! library, so the library only ever emits events and the binary decides
//! where they go.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogFormat, LogLevel, LoggingError, LoggingGuard};
pub use tracing::{debug, error, info, trace, warn};
