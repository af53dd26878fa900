//! Canonical schema constants for emitted records
//!
//! These constants keep the record shape identical across the facade,
//! the encoder and the database adapter.

// Record keys, in the order they appear in every encoded record
pub const KEY_TIME: &str = "time";
pub const KEY_LEVEL: &str = "level";
pub const KEY_LOGGER: &str = "logger";
pub const KEY_CALLER: &str = "caller";
pub const KEY_MESSAGE: &str = "message";
pub const KEY_STACKTRACE: &str = "stacktrace";

/// Timestamp layout for the `time` key
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date layout used to stamp log file names
pub const FILE_DATE_FORMAT: &str = "%Y-%m-%d";

// Event fields carried from the facade to the encoder
pub const EVENT_FIELDS: &str = "fields";
pub const EVENT_FATAL: &str = "fatal";

// Facade scopes and messages
pub const SCOPE_DUMP: &str = "Dump";
pub const SCOPE_LOGGER: &str = "Logger";
pub const SCOPE_DATABASE: &str = "Database";
pub const DUMP_DEFAULT_KEY: &str = "data";
pub const MSG_ERROR_OCCURRED: &str = "Error Occurred";
pub const FIELD_MARSHAL_ERROR: &str = "JSON marshal error";

// Database adapter fields
pub const FIELD_SQL: &str = "sql";
pub const FIELD_ELAPSED: &str = "elapsed";
pub const FIELD_ROWS: &str = "rows";
pub const FIELD_ERROR: &str = "error";

// Database adapter message tags
pub const MSG_DB_NOT_FOUND: &str = "Database Record Not Found";
pub const MSG_DB_ERROR: &str = "Database Error";
pub const MSG_DB_SLOW: &str = "Database Slow Query";
pub const MSG_DB_QUERY: &str = "Database Query";
