//! applog Core - Structured application logging facade
//!
//! This crate provides:
//! - `Logger`, a leveled JSON logger writing to standard output and a
//!   date-stamped, size-rotated log file
//! - Option-based and TOML configuration (`LoggerConfig`)
//! - `SqlLogger`, which plugs a `Logger` into the `applog-db` access layer and
//!   attributes every query record to the application frame that issued it
//! - Test capture of emitted records for assertions
//!
//! Records are JSON objects with the keys `time`, `level`, `logger`, `caller`,
//! `message`, an optional `stacktrace`, then the custom fields in call order.

pub mod caller;
pub mod config;
pub mod encoder;
pub mod errors;
pub mod field;
pub mod logger;
pub mod sink;
pub mod sql_logger;
pub mod test_capture;

// Re-export commonly used types
pub use applog_core_types::Level;
pub use config::{
    with_capture, with_compress, with_file_name, with_level, with_local_time, with_max_age,
    with_max_backups, with_max_size, LoggerConfig, LoggerOption,
};
pub use errors::{LogError, LogErrorKind, Result};
pub use field::Field;
pub use logger::{FatalLogger, Logger};
pub use sql_logger::{with_skip_path, with_slow_threshold, SqlLogger, SqlLoggerOption};
pub use test_capture::{CapturedEvent, TestCapture, TestCaptureLayer};
