pub mod fake_orm;

use applog_core::{with_capture, with_file_name, with_level, Logger, LoggerOption, TestCapture};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A logger writing into a fresh temp directory, mirrored into a capture
#[allow(dead_code)]
pub struct Harness {
    pub dir: TempDir,
    pub logger: Arc<Logger>,
    pub capture: TestCapture,
}

#[allow(dead_code)]
impl Harness {
    /// Build a logger at `level` with any extra options appended
    pub fn new(level: &str, extra: impl IntoIterator<Item = LoggerOption>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let capture = TestCapture::new();
        let mut options = vec![
            with_file_name(dir.path().join("logs").join("app.log")),
            with_level(level),
            with_capture(&capture),
        ];
        options.extend(extra);
        let logger = Logger::new(options);
        assert!(logger.is_ready(), "logger failed to build");
        Self {
            dir,
            logger: Arc::new(logger),
            capture,
        }
    }

    /// The dated file records are written to
    pub fn log_path(&self) -> PathBuf {
        applog_core::sink::resolve_path(self.logger.config())
    }

    /// Every line of the log file, parsed
    pub fn file_records(&self) -> Vec<serde_json::Value> {
        self.logger.flush().expect("flush failed");
        std::fs::read_to_string(self.log_path())
            .expect("log file missing")
            .lines()
            .map(|line| serde_json::from_str(line).expect("record is not JSON"))
            .collect()
    }
}
