//! Record fields
//!
//! A field is a key plus a JSON value. Fields keep the order they were given
//! in when encoded.

use crate::errors::Result;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// A single key/value pair attached to a record
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: String,
    value: Value,
}

impl Field {
    /// Build a field from anything convertible to a JSON value
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, value)
    }

    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, value)
    }

    /// Non-finite floats are encoded as `null`
    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, value)
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, value)
    }

    /// Duration rendered in seconds
    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, value.as_secs_f64())
    }

    /// Error rendered with its `Display` text under the `error` key
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Self::string(applog_core_types::schema::FIELD_ERROR, err.to_string())
    }

    /// Any serializable value, written as a string holding its JSON text
    ///
    /// # Errors
    ///
    /// `ERR_SERIALIZATION` when `value` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Self::string(key, serde_json::to_string(value)?))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Encode fields as a JSON object, preserving their order
pub(crate) fn encode_fields(fields: &[Field]) -> String {
    let mut out = String::from("{");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(field.key.clone()).to_string());
        out.push(':');
        out.push_str(&field.value.to_string());
    }
    out.push('}');
    out
}

/// Build a `Vec<Field>` from `key = value` pairs
///
/// # Example
///
/// ```
/// use applog_core::fields;
///
/// let fields = fields!(user = "ada", attempts = 3, admin = false);
/// assert_eq!(fields.len(), 3);
/// assert_eq!(fields[0].key(), "user");
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        ::std::vec::Vec::<$crate::Field>::new()
    };
    ($($key:ident = $value:expr),+ $(,)?) => {
        vec![$($crate::Field::new(stringify!($key), $value)),+]
    };
}
