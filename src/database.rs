//! Application-facing database handle.

use crate::config::DatabaseOptions;
use crate::db::driver::Pool;
use crate::db::executor::QueryExecutor;
use crate::db::format::QueryFormatter;
use crate::db::mysql::MySqlDriver;
use crate::db::observer::{SharedObserver, TracingObserver};
use crate::db::params::{ParamSet, paramify};
use crate::db::transaction::{TransactionScope, run_transaction};
use crate::error::{DbError, DbResult};
use crate::models::{Bindings, Rows, SqlValue};
use std::future::Future;
use std::sync::Arc;

/// A connection pool plus the query helpers built on it.
///
/// # Example
///
/// ```no_run
/// use db_access_layer::{Database, DatabaseOptions, bindings};
///
/// # async fn run() -> db_access_layer::DbResult<()> {
/// let db = Database::new(DatabaseOptions::from_url("mysql://app@localhost/shop").unwrap())?;
///
/// let rows = db
///     .query("SELECT * FROM users WHERE id = :id", Some(&bindings! { "id" => 5 }))
///     .await?;
///
/// db.transaction(|tx| async move {
///     tx.query("UPDATE stock SET qty = qty - 1 WHERE sku = :sku", Some(&bindings! { "sku" => "A1" }))
///         .await?;
///     tx.query("INSERT INTO orders (sku) VALUES (:sku)", Some(&bindings! { "sku" => "A1" }))
///         .await
/// })
/// .await?;
///
/// db.end().await;
/// # Ok(())
/// # }
/// ```
pub struct Database<P: Pool = MySqlDriver> {
    pool: P,
    executor: QueryExecutor,
}

impl Database<MySqlDriver> {
    /// Create a MySQL-backed database. No connection is opened until the first query.
    ///
    /// With `show_debug_info` set, formatted SQL and query timings are logged
    /// through `tracing`.
    pub fn new(options: DatabaseOptions) -> DbResult<Self> {
        let observer: Option<SharedObserver> = if options.show_debug_info {
            Some(Arc::new(TracingObserver))
        } else {
            None
        };
        Self::build(options, observer)
    }

    /// Create a MySQL-backed database reporting to a custom observer.
    pub fn with_observer(options: DatabaseOptions, observer: SharedObserver) -> DbResult<Self> {
        Self::build(options, Some(observer))
    }

    fn build(options: DatabaseOptions, observer: Option<SharedObserver>) -> DbResult<Self> {
        options.validate().map_err(DbError::invalid_input)?;
        let pool = MySqlDriver::new(&options, QueryFormatter::mysql(observer.clone()));
        Ok(Self::from_pool(pool, observer))
    }
}

impl<P: Pool> Database<P> {
    /// Wrap an existing pool. `observer` receives execution events; formatting
    /// events are the pool's concern.
    pub fn from_pool(pool: P, observer: Option<SharedObserver>) -> Self {
        let executor = match observer {
            Some(observer) => QueryExecutor::with_observer(observer),
            None => QueryExecutor::new(),
        };
        Self { pool, executor }
    }

    /// Run a single query outside any transaction.
    pub async fn query(&self, sql: &str, bindings: Option<&Bindings>) -> DbResult<Rows> {
        self.executor
            .execute(sql, self.pool.query(sql, bindings))
            .await
    }

    /// Format `template` with the pool's formatting hook, without running it.
    pub fn query_format(&self, template: &str, bindings: Option<&Bindings>) -> String {
        self.pool.format(template, bindings)
    }

    /// Run `work` inside a transaction on a dedicated connection.
    ///
    /// See [`run_transaction`] for the commit, rollback and release guarantees.
    pub async fn transaction<F, Fut, T>(&self, work: F) -> DbResult<T>
    where
        F: FnOnce(TransactionScope<P::Connection>) -> Fut,
        Fut: Future<Output = DbResult<T>>,
    {
        run_transaction(&self.pool, &self.executor, work).await
    }

    /// Bind a list of values to placeholders named `prefix0`, `prefix1`, ...
    pub fn paramify<I, V>(&self, list: I, prefix: &str) -> ParamSet
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        paramify(list, prefix)
    }

    /// Close the pool once checked-out connections are returned.
    pub async fn end(&self) {
        self.pool.end().await;
    }
}
