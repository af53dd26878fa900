//! Two wrapping layers standing in for a data library's internal call chain

use applog_db::{DbError, QueryLogger};
use std::time::{Duration, Instant};

/// Path marker identifying this file's frames
pub const SKIP_MARKER: &str = "/tests/common/fake_orm.rs";

pub struct FakeOrm {
    logger: Box<dyn QueryLogger>,
}

#[allow(dead_code)]
impl FakeOrm {
    pub fn new(logger: Box<dyn QueryLogger>) -> Self {
        Self { logger }
    }

    /// Report `sql` as if it had taken `elapsed`
    #[inline(never)]
    pub fn find(&self, sql: &str, rows: i64, elapsed: Duration, err: Option<&DbError>) {
        self.statement(sql, rows, elapsed, err);
    }

    #[inline(never)]
    fn statement(&self, sql: &str, rows: i64, elapsed: Duration, err: Option<&DbError>) {
        let begin = Instant::now()
            .checked_sub(elapsed)
            .expect("elapsed exceeds uptime");
        self.logger.trace(begin, &|| (sql.to_string(), rows), err);
    }
}
