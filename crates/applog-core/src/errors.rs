use applog_core_types::ParseLevelError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using LogError
pub type Result<T> = std::result::Result<T, LogError>;

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// handling and in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogErrorKind {
    /// The configured level names no known level
    InvalidLevel,
    /// The log file or its directory could not be prepared
    Sink,
    /// The configuration source could not be read or parsed
    InvalidConfig,
    /// A value could not be marshaled to JSON
    Serialization,
}

impl LogErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            LogErrorKind::InvalidLevel => "ERR_INVALID_LEVEL",
            LogErrorKind::Sink => "ERR_SINK",
            LogErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            LogErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }
}

/// Errors raised while configuring or building a logger
///
/// Errors are `Clone` so a failed one-time build can be reported to every
/// later caller of `Logger::init`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogError {
    #[error("invalid log level: {0}")]
    InvalidLevel(#[from] ParseLevelError),

    #[error("log sink unavailable at {}: {message}", .path.display())]
    Sink { path: PathBuf, message: String },

    #[error("invalid logger configuration: {0}")]
    InvalidConfig(String),

    #[error("json marshal failed: {0}")]
    Serialization(String),
}

impl LogError {
    /// Get the error kind
    pub fn kind(&self) -> LogErrorKind {
        match self {
            LogError::InvalidLevel(_) => LogErrorKind::InvalidLevel,
            LogError::Sink { .. } => LogErrorKind::Sink,
            LogError::InvalidConfig(_) => LogErrorKind::InvalidConfig,
            LogError::Serialization(_) => LogErrorKind::Serialization,
        }
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub(crate) fn sink(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        LogError::Sink {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        LogError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LogError {
    fn from(err: toml::de::Error) -> Self {
        LogError::InvalidConfig(err.to_string())
    }
}
