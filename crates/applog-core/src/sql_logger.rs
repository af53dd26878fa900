//! Database logging adapter
//!
//! `SqlLogger` plugs a [`Logger`] into the access layer's `QueryLogger`
//! contract. Every finished statement produces a debug `Database Query`
//! record; failures and slow statements produce an additional warn or error
//! record. The `caller` of each record is the application frame that issued
//! the statement, found by walking the stack past the access layer.

use crate::caller::{find_call_site, FrameFilter};
use crate::encoder::short_caller;
use crate::field::Field;
use crate::logger::Logger;
use applog_core_types::schema::{
    FIELD_ELAPSED, FIELD_ROWS, FIELD_SQL, MSG_DB_ERROR, MSG_DB_NOT_FOUND, MSG_DB_QUERY,
    MSG_DB_SLOW, SCOPE_DATABASE,
};
use applog_core_types::Level;
use applog_db::{DbError, LogMode, QueryLogger};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Statements slower than this are reported as slow unless configured otherwise
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(200);

/// One adjustment of a `SqlLogger`
#[derive(Debug, Clone)]
pub enum SqlLoggerOption {
    SlowThreshold(Duration),
    SkipPath(String),
}

/// Slow-query threshold; zero disables slow classification
pub fn with_slow_threshold(threshold: Duration) -> SqlLoggerOption {
    SqlLoggerOption::SlowThreshold(threshold)
}

/// Treat frames whose source path contains `marker` as part of the data layer
pub fn with_skip_path(marker: impl Into<String>) -> SqlLoggerOption {
    SqlLoggerOption::SkipPath(marker.into())
}

/// Milliseconds with microsecond precision, e.g. `250.013ms`
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}ms", elapsed.as_nanos() as f64 / 1e6)
}

/// `QueryLogger` writing through a [`Logger`]
#[derive(Debug, Clone)]
pub struct SqlLogger {
    logger: Arc<Logger>,
    slow_threshold: Duration,
    filter: Arc<FrameFilter>,
}

impl SqlLogger {
    pub fn new(logger: Arc<Logger>, options: impl IntoIterator<Item = SqlLoggerOption>) -> Self {
        let mut slow_threshold = DEFAULT_SLOW_THRESHOLD;
        let mut filter = FrameFilter::new();
        for option in options {
            match option {
                SqlLoggerOption::SlowThreshold(threshold) => slow_threshold = threshold,
                SqlLoggerOption::SkipPath(marker) => filter = filter.skip_path(marker),
            }
        }
        Self {
            logger,
            slow_threshold,
            filter: Arc::new(filter),
        }
    }

    pub fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    fn caller(&self) -> String {
        find_call_site(&self.filter)
            .map(|site| site.short())
            .unwrap_or_else(|| short_caller(file!(), line!()))
    }

    fn message(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.logger.enabled(level) {
            return;
        }
        let message = args.to_string();
        self.logger
            .emit(level, SCOPE_DATABASE, &message, &[], &self.caller());
    }

    fn is_slow(&self, elapsed: Duration) -> bool {
        !self.slow_threshold.is_zero() && elapsed > self.slow_threshold
    }
}

impl QueryLogger for SqlLogger {
    fn log_mode(&self, _mode: LogMode) -> Box<dyn QueryLogger> {
        Box::new(self.clone())
    }

    // Routine access-layer chatter is only interesting when debugging.
    fn info(&self, args: fmt::Arguments<'_>) {
        self.message(Level::Debug, args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.message(Level::Warn, args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        self.message(Level::Error, args);
    }

    fn trace(&self, begin: Instant, query: &dyn Fn() -> (String, i64), err: Option<&DbError>) {
        let elapsed = begin.elapsed();
        let slow = self.is_slow(elapsed);
        let failure = err.map(|err| {
            if err.is_record_not_found() {
                Level::Warn
            } else {
                Level::Error
            }
        });

        let wanted = [
            failure,
            slow.then_some(Level::Warn),
            Some(Level::Debug),
        ];
        if !wanted.into_iter().flatten().any(|level| self.logger.enabled(level)) {
            return;
        }

        let (sql, rows) = query();
        let caller = self.caller();
        let fields = [
            Field::string(FIELD_SQL, sql),
            Field::string(FIELD_ELAPSED, format_elapsed(elapsed)),
            Field::int(FIELD_ROWS, rows),
        ];

        if let Some(err) = err {
            if err.is_record_not_found() {
                self.logger
                    .emit(Level::Warn, SCOPE_DATABASE, MSG_DB_NOT_FOUND, &fields, &caller);
            } else {
                let mut with_error = fields.to_vec();
                with_error.push(Field::error(err));
                self.logger
                    .emit(Level::Error, SCOPE_DATABASE, MSG_DB_ERROR, &with_error, &caller);
            }
        }

        if slow {
            self.logger
                .emit(Level::Warn, SCOPE_DATABASE, MSG_DB_SLOW, &fields, &caller);
        }

        self.logger
            .emit(Level::Debug, SCOPE_DATABASE, MSG_DB_QUERY, &fields, &caller);
    }
}
