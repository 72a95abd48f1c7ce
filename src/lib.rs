//! DB Access Layer Library
//!
//! A small access layer over a MySQL connection pool: named-parameter query
//! formatting, timing and debug instrumentation, and a transaction helper that
//! guarantees commit-or-rollback and release of the connection.

pub mod config;
pub mod database;
pub mod db;
pub mod error;
pub mod models;

pub use config::{DatabaseOptions, PoolOptions};
pub use database::Database;
pub use db::{
    Escaper, MySqlEscaper, ParamSet, QueryEvent, QueryObserver, TracingObserver,
    TransactionScope, format_query, paramify,
};
pub use error::{DbError, DbResult};
pub use models::{Bindings, Rows, SqlValue};
