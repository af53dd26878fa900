//! Logger configuration
//!
//! A `LoggerConfig` starts from fixed defaults and is adjusted by an ordered
//! list of `LoggerOption`s; later options win on conflicting fields. It can also
//! be read from TOML, in which case missing keys keep their defaults.

use crate::errors::{LogError, Result};
use crate::test_capture::TestCapture;
use applog_core_types::Level;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_FILE_NAME: &str = "logs/logs.log";
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;
pub const DEFAULT_MAX_BACKUPS: usize = 7;
pub const DEFAULT_MAX_AGE_DAYS: u32 = 30;

/// Settings for a `Logger`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Base path of the log file; the file name is date-stamped when opened
    pub file_name: PathBuf,
    /// Size in megabytes a file may reach before it is rotated (0 = unlimited)
    pub max_size: u64,
    /// Rotated files to keep (0 = no count limit)
    pub max_backups: usize,
    /// Days to keep rotated files, used when no count limit is set (0 = forever)
    pub max_age: u32,
    /// Gzip rotated files
    pub compress: bool,
    /// Use local time instead of UTC for timestamps and file dates
    pub local_time: bool,
    /// Minimum level to emit: debug, info, warn, error or fatal
    pub level: String,
    #[serde(skip)]
    pub(crate) capture: Option<TestCapture>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            file_name: PathBuf::from(DEFAULT_FILE_NAME),
            max_size: DEFAULT_MAX_SIZE_MB,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age: DEFAULT_MAX_AGE_DAYS,
            compress: false,
            local_time: false,
            level: Level::Info.as_str().to_string(),
            capture: None,
        }
    }
}

impl LoggerConfig {
    /// Defaults with `options` applied in order
    pub fn with_options(options: impl IntoIterator<Item = LoggerOption>) -> Self {
        Self::default().apply(options)
    }

    /// Apply `options` in order
    pub fn apply(mut self, options: impl IntoIterator<Item = LoggerOption>) -> Self {
        for option in options {
            option.apply(&mut self);
        }
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| {
            LogError::InvalidConfig(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&source)
    }

    /// The configured minimum level
    pub fn parsed_level(&self) -> Result<Level> {
        Ok(self.level.parse::<Level>()?)
    }
}

/// One mutation of a `LoggerConfig`
#[derive(Debug, Clone)]
pub enum LoggerOption {
    FileName(PathBuf),
    MaxSize(u64),
    MaxBackups(usize),
    MaxAge(u32),
    Compress(bool),
    LocalTime(bool),
    Level(String),
    Capture(TestCapture),
}

impl LoggerOption {
    fn apply(self, config: &mut LoggerConfig) {
        match self {
            LoggerOption::FileName(path) => config.file_name = path,
            LoggerOption::MaxSize(mb) => config.max_size = mb,
            LoggerOption::MaxBackups(n) => config.max_backups = n,
            LoggerOption::MaxAge(days) => config.max_age = days,
            LoggerOption::Compress(on) => config.compress = on,
            LoggerOption::LocalTime(on) => config.local_time = on,
            LoggerOption::Level(level) => config.level = level,
            LoggerOption::Capture(capture) => config.capture = Some(capture),
        }
    }
}

pub fn with_file_name(path: impl Into<PathBuf>) -> LoggerOption {
    LoggerOption::FileName(path.into())
}

pub fn with_max_size(megabytes: u64) -> LoggerOption {
    LoggerOption::MaxSize(megabytes)
}

pub fn with_max_backups(count: usize) -> LoggerOption {
    LoggerOption::MaxBackups(count)
}

pub fn with_max_age(days: u32) -> LoggerOption {
    LoggerOption::MaxAge(days)
}

pub fn with_compress(compress: bool) -> LoggerOption {
    LoggerOption::Compress(compress)
}

pub fn with_local_time(local_time: bool) -> LoggerOption {
    LoggerOption::LocalTime(local_time)
}

/// Minimum level; validated when the logger is built
pub fn with_level(level: impl Into<String>) -> LoggerOption {
    LoggerOption::Level(level.into())
}

/// Mirror every emitted record into `capture`
pub fn with_capture(capture: &TestCapture) -> LoggerOption {
    LoggerOption::Capture(capture.clone())
}
