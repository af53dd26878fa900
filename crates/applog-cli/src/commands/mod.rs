pub mod emit;
pub mod sql;
