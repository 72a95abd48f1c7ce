//! In-memory driver for lifecycle tests.
//!
//! `MockPool` records every driver call in order and can be told to fail at
//! any step. It understands a tiny statement language against one shared
//! table so transactional visibility can be checked:
//!
//! - `INSERT <text>` adds a row (held back until commit inside a transaction)
//! - `SELECT ...` returns the committed rows as `{"value": <text>}`
//! - anything containing `FAIL` returns a database error

#![allow(dead_code)]

use db_access_layer::db::{Connection, Pool, QueryFormatter};
use db_access_layer::{Bindings, DbError, DbResult, Rows};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Acquire,
    Begin,
    Query(String),
    Commit,
    Rollback,
    Release,
}

#[derive(Default)]
pub struct MockState {
    events: Mutex<Vec<Event>>,
    committed: Mutex<Vec<String>>,
    pub fail_acquire: AtomicBool,
    pub fail_begin: AtomicBool,
    pub fail_commit: AtomicBool,
    pub fail_rollback: AtomicBool,
}

impl MockState {
    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    pub fn queries(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Query(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn committed(&self) -> Vec<String> {
        self.committed.lock().unwrap().clone()
    }

    fn injected(flag: &AtomicBool, what: &str) -> DbResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(DbError::connection(format!("{what} failed"), "injected"))
        } else {
            Ok(())
        }
    }
}

#[derive(Clone)]
pub struct MockPool {
    pub state: Arc<MockState>,
    formatter: QueryFormatter,
}

impl MockPool {
    pub fn new() -> Self {
        Self::with_formatter(QueryFormatter::default())
    }

    pub fn with_formatter(formatter: QueryFormatter) -> Self {
        Self {
            state: Arc::default(),
            formatter,
        }
    }
}

pub struct MockConnection {
    state: Arc<MockState>,
    formatter: QueryFormatter,
    pending: Option<Vec<String>>,
}

fn run_statement(
    state: &MockState,
    pending: Option<&mut Vec<String>>,
    sql: String,
) -> DbResult<Rows> {
    state.record(Event::Query(sql.clone()));

    if sql.contains("FAIL") {
        return Err(DbError::database(
            format!("statement failed: {sql}"),
            Some("HY000".to_string()),
            "injected",
        ));
    }

    if let Some(value) = sql.strip_prefix("INSERT ") {
        match pending {
            Some(pending) => pending.push(value.to_string()),
            None => state.committed.lock().unwrap().push(value.to_string()),
        }
        return Ok(Rows::new());
    }

    Ok(state
        .committed()
        .into_iter()
        .map(|value| {
            let mut row = serde_json::Map::new();
            row.insert("value".to_string(), json!(value));
            row
        })
        .collect())
}

impl Pool for MockPool {
    type Connection = MockConnection;

    async fn query(&self, sql: &str, bindings: Option<&Bindings>) -> DbResult<Rows> {
        let sql = self.formatter.format(sql, bindings);
        run_statement(&self.state, None, sql)
    }

    async fn get_connection(&self) -> DbResult<MockConnection> {
        MockState::injected(&self.state.fail_acquire, "acquire")?;
        self.state.record(Event::Acquire);
        Ok(MockConnection {
            state: self.state.clone(),
            formatter: self.formatter.clone(),
            pending: None,
        })
    }

    fn format(&self, template: &str, bindings: Option<&Bindings>) -> String {
        self.formatter.format(template, bindings)
    }

    async fn end(&self) {}
}

impl Connection for MockConnection {
    async fn query(&mut self, sql: &str, bindings: Option<&Bindings>) -> DbResult<Rows> {
        // Yield so concurrent scope clones actually interleave at the lock.
        tokio::task::yield_now().await;
        let sql = self.formatter.format(sql, bindings);
        run_statement(&self.state, self.pending.as_mut(), sql)
    }

    async fn begin_transaction(&mut self) -> DbResult<()> {
        self.state.record(Event::Begin);
        MockState::injected(&self.state.fail_begin, "begin")?;
        self.pending = Some(Vec::new());
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.state.record(Event::Commit);
        MockState::injected(&self.state.fail_commit, "commit")?;
        if let Some(pending) = self.pending.take() {
            self.state.committed.lock().unwrap().extend(pending);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.state.record(Event::Rollback);
        MockState::injected(&self.state.fail_rollback, "rollback")?;
        self.pending = None;
        Ok(())
    }

    fn release(self) {
        self.state.record(Event::Release);
    }
}

/// Application error used as transactional work failure.
#[derive(Debug, thiserror::Error)]
#[error("insufficient funds: balance {balance}")]
pub struct InsufficientFunds {
    pub balance: i64,
}
