#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use applog_core::{with_skip_path, with_slow_threshold, Level, SqlLogger};
use applog_db::{Database, DbError, LogMode, QueryLogger};
use common::fake_orm::{FakeOrm, SKIP_MARKER};
use common::Harness;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn orm(h: &Harness, threshold: Duration) -> FakeOrm {
    let sql = SqlLogger::new(
        Arc::clone(&h.logger),
        [with_slow_threshold(threshold), with_skip_path(SKIP_MARKER)],
    );
    FakeOrm::new(Box::new(sql))
}

fn summary(h: &Harness) -> Vec<(Level, String)> {
    h.capture
        .events()
        .into_iter()
        .map(|e| (e.level, e.message.unwrap_or_default()))
        .collect()
}

#[test]
fn test_slow_query_writes_warn_and_debug() {
    let h = Harness::new("debug", []);
    let orm = orm(&h, Duration::from_millis(200));
    orm.find("SELECT * FROM orders", 3, Duration::from_millis(250), None);

    assert_eq!(
        summary(&h),
        vec![
            (Level::Warn, "Database Slow Query".to_string()),
            (Level::Debug, "Database Query".to_string()),
        ]
    );
    let events = h.capture.events();
    assert_eq!(events[0].field("sql"), Some(&Value::from("SELECT * FROM orders")));
    assert_eq!(events[0].field("rows"), Some(&Value::from(3)));
    assert!(events[0]
        .field("elapsed")
        .and_then(Value::as_str)
        .unwrap()
        .ends_with("ms"));
}

#[test]
fn test_fast_query_writes_debug_only() {
    let h = Harness::new("debug", []);
    let orm = orm(&h, Duration::from_millis(200));
    orm.find("SELECT 1", 1, Duration::ZERO, None);

    assert_eq!(summary(&h), vec![(Level::Debug, "Database Query".to_string())]);
}

#[test]
fn test_record_not_found_is_a_warning() {
    let h = Harness::new("debug", []);
    let orm = orm(&h, Duration::from_millis(200));
    orm.find(
        "SELECT * FROM orders WHERE id = 9",
        0,
        Duration::ZERO,
        Some(&DbError::RecordNotFound),
    );

    assert_eq!(
        summary(&h),
        vec![
            (Level::Warn, "Database Record Not Found".to_string()),
            (Level::Debug, "Database Query".to_string()),
        ]
    );
    assert_eq!(h.capture.count_events(|e| e.level == Level::Error), 0);
}

#[test]
fn test_generic_error_attaches_error_field() {
    let h = Harness::new("debug", []);
    let orm = orm(&h, Duration::from_millis(200));
    let err = DbError::from(rusqlite::Error::ExecuteReturnedResults);
    orm.find("INSERT INTO orders", -1, Duration::from_millis(5), Some(&err));

    assert_eq!(
        summary(&h),
        vec![
            (Level::Error, "Database Error".to_string()),
            (Level::Debug, "Database Query".to_string()),
        ]
    );
    let events = h.capture.events();
    assert_eq!(events[0].field("error"), Some(&Value::from(err.to_string())));
    assert!(events[0].stacktrace.is_some());
    assert!(events[1].field("error").is_none());
}

#[test]
fn test_slow_failure_writes_three_records() {
    let h = Harness::new("debug", []);
    let orm = orm(&h, Duration::from_millis(200));
    let err = DbError::from(rusqlite::Error::ExecuteReturnedResults);
    orm.find("UPDATE orders", -1, Duration::from_millis(300), Some(&err));

    let levels: Vec<Level> = summary(&h).into_iter().map(|(l, _)| l).collect();
    assert_eq!(levels, vec![Level::Error, Level::Warn, Level::Debug]);
}

#[test]
fn test_zero_threshold_disables_slow_records() {
    let h = Harness::new("debug", []);
    let orm = orm(&h, Duration::ZERO);
    orm.find("SELECT 1", 1, Duration::from_secs(2), None);

    assert_eq!(summary(&h), vec![(Level::Debug, "Database Query".to_string())]);
}

#[test]
fn test_caller_skips_wrapping_layers() {
    let h = Harness::new("debug", []);
    let orm = orm(&h, Duration::from_millis(200));
    let line = line!() + 1;
    orm.find("SELECT 1", 1, Duration::ZERO, None);

    let expected = format!("tests/sql_logger_tests.rs:{}", line);
    let events = h.capture.events();
    assert_eq!(events[0].caller.as_deref(), Some(expected.as_str()));
}

#[test]
fn test_caller_skips_database_layer() {
    let h = Harness::new("debug", []);
    let sql = SqlLogger::new(Arc::clone(&h.logger), []);
    let db = Database::open_in_memory(Box::new(sql)).unwrap();
    h.capture.clear();

    let line = line!() + 1;
    db.execute_batch("CREATE TABLE orders (id INTEGER PRIMARY KEY);").unwrap();

    let expected = format!("tests/sql_logger_tests.rs:{}", line);
    let events = h.capture.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].caller.as_deref(), Some(expected.as_str()));
    assert_eq!(events[0].field("rows"), Some(&Value::from(-1)));
}

#[test]
fn test_database_reports_not_found_and_returns_it() {
    let h = Harness::new("debug", []);
    let sql = SqlLogger::new(Arc::clone(&h.logger), []);
    let db = Database::open_in_memory(Box::new(sql)).unwrap();
    db.execute_batch("CREATE TABLE orders (id INTEGER PRIMARY KEY);").unwrap();
    h.capture.clear();

    let err = db
        .query_row("SELECT id FROM orders WHERE id = ?1", [1], |row| {
            row.get::<_, i64>(0)
        })
        .unwrap_err();

    assert!(err.is_record_not_found());
    h.capture.assert_event_exists("Database", "Database Record Not Found");
    h.capture.assert_event_exists("Database", "Database Query");
}

#[test]
fn test_access_layer_messages() {
    let h = Harness::new("debug", []);
    let sql = SqlLogger::new(Arc::clone(&h.logger), []);
    let _db = Database::open_in_memory(Box::new(sql)).unwrap();

    let events = h.capture.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, Level::Debug);
    assert_eq!(events[0].message.as_deref(), Some("opened in-memory database"));
}

#[test]
fn test_info_level_hides_routine_queries() {
    let h = Harness::new("info", []);
    let orm = orm(&h, Duration::from_millis(200));
    orm.find("SELECT 1", 1, Duration::ZERO, None);
    orm.find("SELECT 2", 1, Duration::from_millis(400), None);

    assert_eq!(summary(&h), vec![(Level::Warn, "Database Slow Query".to_string())]);
}

#[test]
fn test_log_mode_keeps_behaviour() {
    let h = Harness::new("debug", []);
    let sql = SqlLogger::new(Arc::clone(&h.logger), []);
    let silent = sql.log_mode(LogMode::Silent);
    silent.warn(format_args!("pool exhausted"));

    h.capture.assert_event_exists("Database", "pool exhausted");
}
