//! Severity levels
//!
//! Levels are totally ordered: `Debug < Info < Warn < Error < Fatal`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record severity
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Emitted at error severity, then the process terminates
    Fatal,
}

impl Level {
    /// All levels in ascending severity
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Lower-case name, as accepted in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Upper-case name, as rendered in records
    pub fn as_upper(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A level string that names no known level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    input: String,
}

impl ParseLevelError {
    /// The rejected input
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized level {:?} (expected one of debug, info, warn, error, fatal)",
            self.input
        )
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Case-insensitive; the empty string means `info`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" | "" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            _ => Err(ParseLevelError {
                input: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_known_levels() {
        assert_eq!("debug".parse::<Level>(), Ok(Level::Debug));
        assert_eq!("INFO".parse::<Level>(), Ok(Level::Info));
        assert_eq!("Warn".parse::<Level>(), Ok(Level::Warn));
        assert_eq!("error".parse::<Level>(), Ok(Level::Error));
        assert_eq!("fatal".parse::<Level>(), Ok(Level::Fatal));
    }

    #[test]
    fn test_empty_string_is_info() {
        assert_eq!("".parse::<Level>(), Ok(Level::Info));
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let err = "verbose".parse::<Level>().unwrap_err();
        assert_eq!(err.input(), "verbose");
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn test_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Level::Warn).unwrap();
        assert_eq!(json, "\"warn\"");
        let level: Level = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(level, Level::Error);
    }

    proptest! {
        #[test]
        fn prop_display_round_trips(idx in 0usize..5) {
            let level = Level::ALL[idx];
            prop_assert_eq!(level.to_string().parse::<Level>(), Ok(level));
            prop_assert_eq!(level.as_upper().parse::<Level>(), Ok(level));
        }
    }
}
