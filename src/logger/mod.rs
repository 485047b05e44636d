//! Structured logging with per-subsystem tags
//!
//! Provides level-specific logging functions with per-tag debug gating and
//! colored console output:
//!
//! ```rust
//! use walletfeed::logger::{self, LogTag};
//!
//! logger::info(LogTag::Pool, "merged 5 records from 3 sources");
//! logger::debug(LogTag::Cache, "series cache miss"); // only if cache debug enabled
//! ```
//!
//! Debug output is off by default; enable it per tag:
//!
//! ```rust
//! use walletfeed::logger::{set_logger_config, LoggerConfig, LogTag};
//!
//! set_logger_config(LoggerConfig::default().with_debug_tag(LogTag::Cache));
//! ```

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, update_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level; only shown when the tag is debug-enabled
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level; only shown when verbose output is enabled
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
