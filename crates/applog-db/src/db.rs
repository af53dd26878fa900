//! Database connection management
//!
//! Wraps a SQLite connection so every statement is timed and reported to a
//! `QueryLogger` once it finishes.

use crate::errors::{DbError, Result};
use crate::query_logger::{LogMode, QueryLogger};
use rusqlite::{Connection, Params, Row};
use std::path::Path;
use std::time::Instant;

/// A SQLite connection with statement logging
pub struct Database {
    conn: Connection,
    logger: Box<dyn QueryLogger>,
}

impl Database {
    /// Open a SQLite database at the given path
    pub fn open<P: AsRef<Path>>(path: P, logger: Box<dyn QueryLogger>) -> Result<Self> {
        let path = path.as_ref();
        match Connection::open(path) {
            Ok(conn) => {
                logger.info(format_args!("opened database {}", path.display()));
                Ok(Self { conn, logger })
            }
            Err(err) => {
                logger.error(format_args!(
                    "failed to open database {}: {}",
                    path.display(),
                    err
                ));
                Err(err.into())
            }
        }
    }

    /// Open an in-memory SQLite database (for testing)
    pub fn open_in_memory(logger: Box<dyn QueryLogger>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        logger.info(format_args!("opened in-memory database"));
        Ok(Self { conn, logger })
    }

    /// Configure the connection with the usual pragmas
    pub fn configure(&self) -> Result<()> {
        self.execute_batch("PRAGMA foreign_keys = ON;")
    }

    /// Swap the logger for one configured at `mode`
    pub fn set_log_mode(&mut self, mode: LogMode) {
        self.logger = self.logger.log_mode(mode);
    }

    /// The logger statements are reported to
    pub fn logger(&self) -> &dyn QueryLogger {
        self.logger.as_ref()
    }

    /// Execute a single statement, returning the number of changed rows
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let begin = Instant::now();
        let result = self.conn.execute(sql, params).map_err(DbError::from);
        let rows = result.as_ref().map(|n| *n as i64).unwrap_or(0);
        self.report(begin, sql, rows, result.as_ref().err());
        result
    }

    /// Execute one or more statements without parameters
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let begin = Instant::now();
        let result = self.conn.execute_batch(sql).map_err(DbError::from);
        self.report(begin, sql, -1, result.as_ref().err());
        result
    }

    /// Query exactly one row
    ///
    /// A query that matches nothing fails with `DbError::RecordNotFound`.
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let begin = Instant::now();
        let result = self
            .conn
            .query_row(sql, params, f)
            .map_err(DbError::from_query);
        let rows = if result.is_ok() { 1 } else { 0 };
        self.report(begin, sql, rows, result.as_ref().err());
        result
    }

    /// Query all matching rows
    pub fn query_all<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let begin = Instant::now();
        let result = self.collect_rows(sql, params, f);
        let rows = result.as_ref().map(|v| v.len() as i64).unwrap_or(0);
        self.report(begin, sql, rows, result.as_ref().err());
        result
    }

    fn collect_rows<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, f)?;
        let collected = rows.collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(collected)
    }

    fn report(&self, begin: Instant, sql: &str, rows: i64, err: Option<&DbError>) {
        self.logger.trace(begin, &|| (sql.to_string(), rows), err);
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}
