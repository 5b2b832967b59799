//! Command implementations for the `godam` binary.

pub mod error;
pub mod output;
pub mod schema;
pub mod validate;
