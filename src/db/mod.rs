//! Database access layer.
//!
//! This module provides:
//! - Named-parameter formatting with MySQL escaping
//! - Query timing and debug instrumentation
//! - Scoped transactions over a driver capability
//! - The `sqlx` MySQL driver and its row decoding

pub mod driver;
pub mod executor;
pub mod format;
#[macro_use]
pub mod macros;
pub mod mysql;
pub mod observer;
pub mod params;
pub mod transaction;
pub mod types;

pub use driver::{Connection, Pool};
pub use executor::QueryExecutor;
pub use format::{Escaper, MySqlEscaper, QueryFormatter, format_query, query_id};
pub use mysql::{MySqlDriver, MySqlDriverConnection};
pub use observer::{QueryEvent, QueryObserver, SharedObserver, TracingObserver};
pub use params::{ParamSet, paramify};
pub use transaction::{TransactionScope, run_transaction};
