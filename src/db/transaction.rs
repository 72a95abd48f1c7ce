//! Scoped transactions.
//!
//! [`run_transaction`] checks a dedicated connection out of a pool, opens a
//! transaction on it and hands caller work a [`TransactionScope`]. When the work
//! finishes the transaction is committed, or rolled back on any failure, and
//! the connection goes back to the pool exactly once.
//!
//! ```text
//! acquire -> begin -> work -> commit ----------> release
//!              |        |        |
//!              +--------+--------+-> rollback -> release
//! ```
//!
//! A scope is closed as soon as the work completes. Queries made through a
//! closed scope (for example from a clone that outlived the work) fail with
//! [`DbError::TransactionClosed`] without touching the connection.

use crate::db::driver::{Connection, Pool};
use crate::db::executor::QueryExecutor;
use crate::error::{DbError, DbResult};
use crate::models::{Bindings, Rows};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Query handle bound to one connection for one transaction attempt.
///
/// Clones share the connection; their queries are serialized.
pub struct TransactionScope<C: Connection> {
    state: Arc<ScopeState<C>>,
}

struct ScopeState<C: Connection> {
    id: String,
    connection: Mutex<Option<C>>,
    closed: AtomicBool,
    executor: QueryExecutor,
}

impl<C: Connection> Drop for ScopeState<C> {
    fn drop(&mut self) {
        // Last clone gone while the connection was still checked out.
        if let Some(conn) = self.connection.get_mut().take() {
            conn.release();
            debug!(transaction_id = %self.id, "Connection released by last scope clone");
        }
    }
}

impl<C: Connection> Clone for TransactionScope<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<C: Connection> std::fmt::Debug for TransactionScope<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope")
            .field("id", &self.state.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum Control {
    Begin,
    Commit,
    Rollback,
}

impl<C: Connection> TransactionScope<C> {
    fn new(connection: C, executor: QueryExecutor) -> Self {
        Self {
            state: Arc::new(ScopeState {
                id: format!("tx_{}", Uuid::new_v4().simple()),
                connection: Mutex::new(Some(connection)),
                closed: AtomicBool::new(false),
                executor,
            }),
        }
    }

    /// Identifier used in log fields and in [`DbError::TransactionClosed`].
    pub fn id(&self) -> &str {
        &self.state.id
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    /// Run a query inside the transaction.
    pub async fn query(&self, sql: &str, bindings: Option<&Bindings>) -> DbResult<Rows> {
        if self.is_closed() {
            return Err(DbError::transaction_closed(self.id()));
        }

        let mut slot = self.state.connection.lock().await;
        // The scope may have closed while this query waited for the lock.
        if self.is_closed() {
            return Err(DbError::transaction_closed(self.id()));
        }
        let Some(conn) = slot.as_mut() else {
            return Err(DbError::transaction_closed(self.id()));
        };

        self.state
            .executor
            .execute(sql, conn.query(sql, bindings))
            .await
    }

    async fn control(&self, op: Control) -> DbResult<()> {
        let mut slot = self.state.connection.lock().await;
        let Some(conn) = slot.as_mut() else {
            return Err(DbError::transaction_closed(self.id()));
        };

        match op {
            Control::Begin => conn.begin_transaction().await,
            Control::Commit => conn.commit().await,
            Control::Rollback => conn.rollback().await,
        }
    }

    fn mark_closed(&self) {
        self.state.closed.store(true, Ordering::Release);
    }

    /// Close the scope and release its connection.
    async fn close(&self) {
        self.mark_closed();
        let connection = self.state.connection.lock().await.take();
        if let Some(conn) = connection {
            conn.release();
            debug!(transaction_id = %self.id(), "Connection released");
        }
    }

    /// Synchronous [`close`](Self::close) for drop paths.
    ///
    /// If another clone holds the connection lock, the connection is released
    /// when the last clone drops instead.
    fn close_now(&self) {
        self.mark_closed();
        match self.state.connection.try_lock() {
            Ok(mut slot) => {
                if let Some(conn) = slot.take() {
                    conn.release();
                }
            }
            Err(_) => debug!(
                transaction_id = %self.id(),
                "Connection busy during abandon; release deferred to last scope clone"
            ),
        }
    }
}

/// Releases the scope's connection exactly once, on every exit path.
struct ReleaseGuard<C: Connection> {
    scope: Option<TransactionScope<C>>,
}

impl<C: Connection> ReleaseGuard<C> {
    fn new(scope: TransactionScope<C>) -> Self {
        Self { scope: Some(scope) }
    }

    async fn release(mut self) {
        if let Some(scope) = self.scope.take() {
            scope.close().await;
        }
    }
}

impl<C: Connection> Drop for ReleaseGuard<C> {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.take() {
            warn!(
                transaction_id = %scope.id(),
                "Transaction abandoned before completion; releasing connection"
            );
            scope.close_now();
        }
    }
}

/// Run `work` inside a transaction on a dedicated connection from `pool`.
///
/// Returns the work's value after a successful commit. On failure the
/// transaction is rolled back and the originating error (work, begin or
/// commit) is returned; if the rollback fails too the result is
/// [`DbError::RollbackFailed`] carrying both.
pub async fn run_transaction<P, F, Fut, T>(
    pool: &P,
    executor: &QueryExecutor,
    work: F,
) -> DbResult<T>
where
    P: Pool,
    F: FnOnce(TransactionScope<P::Connection>) -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let connection = pool.get_connection().await?;
    let scope = TransactionScope::new(connection, executor.clone());
    let guard = ReleaseGuard::new(scope.clone());

    let result = settle(&scope, work).await;

    guard.release().await;
    result
}

async fn settle<C, F, Fut, T>(scope: &TransactionScope<C>, work: F) -> DbResult<T>
where
    C: Connection,
    F: FnOnce(TransactionScope<C>) -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let cause = match scope.control(Control::Begin).await {
        Err(e) => {
            warn!(transaction_id = %scope.id(), error = %e, "Failed to begin transaction");
            e
        }
        Ok(()) => {
            info!(transaction_id = %scope.id(), "Transaction started");
            let result = work(scope.clone()).await;
            scope.mark_closed();

            match result {
                Ok(value) => match scope.control(Control::Commit).await {
                    Ok(()) => {
                        info!(transaction_id = %scope.id(), "Transaction committed");
                        return Ok(value);
                    }
                    Err(e) => {
                        warn!(transaction_id = %scope.id(), error = %e, "Commit failed");
                        e
                    }
                },
                Err(e) => e,
            }
        }
    };

    match scope.control(Control::Rollback).await {
        Ok(()) => {
            info!(
                transaction_id = %scope.id(),
                code = cause.code(),
                "Transaction rolled back"
            );
            Err(cause)
        }
        Err(rollback) => {
            warn!(
                transaction_id = %scope.id(),
                error = %rollback,
                "Rollback failed"
            );
            Err(DbError::rollback_failed(cause, rollback))
        }
    }
}
