//! Error handling for applog-db

use thiserror::Error;

/// Result type alias using DbError
pub type Result<T> = std::result::Result<T, DbError>;

/// Errors returned by the access layer
#[derive(Error, Debug)]
pub enum DbError {
    /// A single-row query matched no rows
    #[error("record not found")]
    RecordNotFound,

    /// Any error reported by the SQLite driver
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    /// Whether this is the "record not found" case
    pub fn is_record_not_found(&self) -> bool {
        matches!(self, DbError::RecordNotFound)
    }

    /// Map a driver error, turning "no rows" into `RecordNotFound`
    pub fn from_query(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => DbError::RecordNotFound,
            other => DbError::Sqlite(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_maps_to_record_not_found() {
        let err = DbError::from_query(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.is_record_not_found());
        assert_eq!(err.to_string(), "record not found");
    }

    #[test]
    fn test_other_errors_stay_driver_errors() {
        let err = DbError::from_query(rusqlite::Error::InvalidQuery);
        assert!(!err.is_record_not_found());
        assert!(err.to_string().starts_with("sqlite:"));
    }
}
