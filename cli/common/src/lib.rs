//! Shared utilities for the datalake worker CLI.
//!
//! Log level selection, logging initialisation and the number and byte
//! formatting used by the end-of-run summary.

pub mod args;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use format::{format_bytes, format_number, format_rate};
pub use logging::init_logging;
