//! Driver capability.
//!
//! The access layer talks to a database only through these two traits. The
//! shipped implementation is [`MySqlDriver`](crate::db::mysql::MySqlDriver);
//! tests plug in an in-memory driver.

use crate::error::DbResult;
use crate::models::{Bindings, Rows};
use std::future::Future;

/// A bounded set of reusable connections.
pub trait Pool: Send + Sync + 'static {
    type Connection: Connection;

    /// Run a single query on any free connection.
    ///
    /// `sql` is a template; the pool applies its formatting hook with `bindings`.
    fn query(
        &self,
        sql: &str,
        bindings: Option<&Bindings>,
    ) -> impl Future<Output = DbResult<Rows>> + Send;

    /// Check out a dedicated connection.
    fn get_connection(&self) -> impl Future<Output = DbResult<Self::Connection>> + Send;

    /// The pool's formatting hook.
    fn format(&self, template: &str, bindings: Option<&Bindings>) -> String;

    /// Wait for checked-out connections to come back, then close everything.
    fn end(&self) -> impl Future<Output = ()> + Send;
}

/// One session checked out of a [`Pool`].
pub trait Connection: Send + 'static {
    fn query(
        &mut self,
        sql: &str,
        bindings: Option<&Bindings>,
    ) -> impl Future<Output = DbResult<Rows>> + Send;

    fn begin_transaction(&mut self) -> impl Future<Output = DbResult<()>> + Send;

    fn commit(&mut self) -> impl Future<Output = DbResult<()>> + Send;

    fn rollback(&mut self) -> impl Future<Output = DbResult<()>> + Send;

    /// Hand the connection back to its pool.
    fn release(self);
}
