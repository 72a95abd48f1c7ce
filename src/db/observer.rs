//! Debug instrumentation hooks.
//!
//! Query formatting and execution report to a [`QueryObserver`] at two points:
//! after a template is formatted and after a query completes. Nothing is reported
//! unless an observer is installed, which is what the `show_debug_info` option does.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A debug record emitted while running a query.
///
/// `query_id` is a content hash of the unformatted template, so repeated runs of
/// one template correlate without the bound values leaking into the identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent<'a> {
    /// A template was formatted into executable SQL.
    Formatted { sql: &'a str, query_id: &'a str },
    /// A query completed successfully.
    Executed {
        sql: &'a str,
        query_id: &'a str,
        elapsed: Duration,
    },
}

/// Receiver for [`QueryEvent`]s.
pub trait QueryObserver: Send + Sync {
    fn observe(&self, event: &QueryEvent<'_>);
}

/// Shared handle to an installed observer.
pub type SharedObserver = Arc<dyn QueryObserver>;

/// Observer that writes query events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn observe(&self, event: &QueryEvent<'_>) {
        match event {
            QueryEvent::Formatted { sql, query_id } => {
                info!(sql = %sql, query_id = %query_id, "Formatted query");
            }
            QueryEvent::Executed {
                query_id, elapsed, ..
            } => {
                info!(t = elapsed.as_secs_f64(), query_id = %query_id, "Query");
            }
        }
    }
}

/// Deliver an event, containing any panic raised by the observer.
///
/// Debug output must never mask the result of the query it describes.
pub(crate) fn notify(observer: &dyn QueryObserver, event: &QueryEvent<'_>) {
    if catch_unwind(AssertUnwindSafe(|| observer.observe(event))).is_err() {
        warn!("Query observer panicked; event dropped");
    }
}
