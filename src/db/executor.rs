//! Instrumented query execution.
//!
//! [`QueryExecutor`] wraps a driver query future with timing. The driver has
//! already been handed the template and bindings, so substitution happens in
//! its formatting hook and is not repeated here. When an observer is installed
//! a successful query is reported as [`QueryEvent::Executed`].

use crate::db::format::query_id;
use crate::db::observer::{QueryEvent, SharedObserver, notify};
use crate::error::DbResult;
use crate::models::Rows;
use std::future::Future;
use std::time::Instant;
use tracing::debug;

/// Query executor that times driver calls and reports them to the debug observer.
#[derive(Clone, Default)]
pub struct QueryExecutor {
    observer: Option<SharedObserver>,
}

impl QueryExecutor {
    /// Create an executor without instrumentation.
    pub fn new() -> Self {
        Self { observer: None }
    }

    /// Create an executor that reports to `observer`.
    pub fn with_observer(observer: SharedObserver) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    /// Await `query`, which runs `sql` on the driver, and return its rows unchanged.
    ///
    /// Errors are passed through as-is; nothing is retried.
    pub async fn execute<F>(&self, sql: &str, query: F) -> DbResult<Rows>
    where
        F: Future<Output = DbResult<Rows>>,
    {
        let start = Instant::now();

        let rows = match query.await {
            Ok(rows) => rows,
            Err(e) => {
                debug!(
                    sql = %sql,
                    code = e.code(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Query failed"
                );
                return Err(e);
            }
        };

        let elapsed = start.elapsed();
        if let Some(observer) = &self.observer {
            let id = query_id(sql);
            notify(
                observer.as_ref(),
                &QueryEvent::Executed {
                    sql,
                    query_id: &id,
                    elapsed,
                },
            );
        }

        Ok(rows)
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("debug", &self.observer.is_some())
            .finish()
    }
}
