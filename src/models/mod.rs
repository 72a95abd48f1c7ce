//! Data models for the database access layer.
//!
//! This module re-exports all model types used throughout the crate.

pub mod query;

// Re-export commonly used types
pub use query::{Bindings, Row, Rows, SqlValue};
