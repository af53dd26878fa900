//! Core types shared across the applog crates
//!
//! This crate provides the vocabulary used by the logging facade, the
//! record encoder and the database logging adapter:
//!
//! - **Levels**: `Level`, parsed from configuration and rendered in records
//! - **Schema constants**: canonical record keys, message tags and field names

pub mod level;
pub mod schema;

pub use level::{Level, ParseLevelError};
