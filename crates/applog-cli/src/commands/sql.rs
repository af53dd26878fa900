//! SQL command
//!
//! Usage: applog sql [--db <PATH>] [--slow-ms <N>] <STATEMENT>...
//!
//! Every statement is reported through the logging adapter. Statements that
//! return rows print them tab-separated; others print the affected row count.

use applog_core::{with_slow_threshold, Logger, SqlLogger};
use applog_db::Database;
use clap::Args;
use rusqlite::types::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const ROW_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES", "PRAGMA", "EXPLAIN"];

#[derive(Debug, Args)]
pub struct SqlArgs {
    /// Database file (default: in-memory)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Slow-query threshold in milliseconds (0 disables)
    #[arg(long, default_value_t = 200)]
    pub slow_ms: u64,

    /// Statements to run, in order
    #[arg(required = true)]
    pub statements: Vec<String>,
}

/// Whether `sql` is expected to produce rows
pub fn returns_rows(sql: &str) -> bool {
    let first = sql.split_whitespace().next().unwrap_or_default();
    ROW_KEYWORDS
        .iter()
        .any(|keyword| first.eq_ignore_ascii_case(keyword))
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Real(x) => x.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

/// Execute sql command
pub fn execute(logger: Arc<Logger>, args: SqlArgs) -> Result<(), Box<dyn std::error::Error>> {
    let adapter = SqlLogger::new(
        logger,
        [with_slow_threshold(Duration::from_millis(args.slow_ms))],
    );
    let db = match &args.db {
        Some(path) => Database::open(path, Box::new(adapter))?,
        None => Database::open_in_memory(Box::new(adapter))?,
    };
    db.configure()?;

    for statement in &args.statements {
        if returns_rows(statement) {
            let rows = db.query_all(statement, [], |row| {
                (0..row.as_ref().column_count())
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })?;
            for row in &rows {
                let cells: Vec<String> = row.iter().map(render).collect();
                println!("{}", cells.join("\t"));
            }
            println!("({} rows)", rows.len());
        } else {
            let changed = db.execute(statement, [])?;
            println!("{} rows affected", changed);
        }
    }

    Ok(())
}
