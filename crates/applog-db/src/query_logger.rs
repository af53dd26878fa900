//! Logger contract for the access layer
//!
//! `Database` never formats or writes log records itself. It reports through a
//! `QueryLogger`, which decides how (and whether) to record each event.

use crate::errors::DbError;
use std::fmt;
use std::time::Instant;

/// Verbosity requested by the access layer's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogMode {
    Silent,
    Error,
    Warn,
    Info,
}

/// Sink for everything the access layer wants to report
///
/// `trace` is invoked once after every executed statement, successful or not.
/// The `query` callback yields the SQL text and the number of affected or
/// returned rows (`-1` when unknown); it is only evaluated by loggers that need it.
pub trait QueryLogger: Send + Sync {
    /// Return a logger configured for `mode`
    fn log_mode(&self, mode: LogMode) -> Box<dyn QueryLogger>;

    fn info(&self, args: fmt::Arguments<'_>);

    fn warn(&self, args: fmt::Arguments<'_>);

    fn error(&self, args: fmt::Arguments<'_>);

    /// Report a finished statement
    fn trace(&self, begin: Instant, query: &dyn Fn() -> (String, i64), err: Option<&DbError>);
}

/// Logger that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NopLogger;

impl QueryLogger for NopLogger {
    fn log_mode(&self, _mode: LogMode) -> Box<dyn QueryLogger> {
        Box::new(*self)
    }

    fn info(&self, _args: fmt::Arguments<'_>) {}

    fn warn(&self, _args: fmt::Arguments<'_>) {}

    fn error(&self, _args: fmt::Arguments<'_>) {}

    fn trace(&self, _begin: Instant, _query: &dyn Fn() -> (String, i64), _err: Option<&DbError>) {}
}
