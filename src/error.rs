//! Error types for the database access layer.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Every variant carries a stable, machine-checkable code (see [`DbError::code`]) so
//! callers can tell programmer errors such as a closed transaction apart from
//! driver failures without matching on messages.

use thiserror::Error;

/// Error code for a query issued through a transaction scope after it settled.
pub const E_TRANSACTION_CLOSED: &str = "E_TRANSACTION_CLOSED";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42S02" for unknown table
        sql_state: Option<String>,
        /// MySQL server error number, e.g. 1062 for a duplicate key
        errno: Option<u16>,
        suggestion: String,
    },

    #[error("Transaction is already closed (transaction: {transaction_id})")]
    TransactionClosed { transaction_id: String },

    #[error(
        "Timeout: {operation}{}",
        .limit_secs.map(|secs| format!(" exceeded {secs}s")).unwrap_or_default()
    )]
    Timeout {
        operation: String,
        limit_secs: Option<u64>,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error(
        "Query contains {count} statements but multiple statements are disabled. Enable 'multiple_statements' to allow them."
    )]
    MultipleStatements { count: usize },

    #[error("Transaction work failed: {source}")]
    Work {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{cause}; rollback also failed: {rollback}")]
    RollbackFailed {
        #[source]
        cause: Box<DbError>,
        rollback: Box<DbError>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            errno: None,
            suggestion: suggestion.into(),
        }
    }

    /// Create a transaction-closed error.
    pub fn transaction_closed(transaction_id: impl Into<String>) -> Self {
        Self::TransactionClosed {
            transaction_id: transaction_id.into(),
        }
    }

    /// Create a timeout error for an operation with a known limit.
    pub fn timeout(operation: impl Into<String>, limit_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            limit_secs: Some(limit_secs),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wrap an application error raised inside transactional work.
    ///
    /// The original error stays reachable through [`std::error::Error::source`]
    /// and can be recovered with `downcast_ref`.
    pub fn work<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Work {
            source: Box::new(source),
        }
    }

    /// Combine the error that triggered a rollback with the rollback's own failure.
    pub fn rollback_failed(cause: DbError, rollback: DbError) -> Self {
        Self::RollbackFailed {
            cause: Box::new(cause),
            rollback: Box::new(rollback),
        }
    }

    /// Machine-checkable error code.
    ///
    /// A `RollbackFailed` error reports the code of the error that caused the rollback.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "E_CONNECTION",
            Self::Database { .. } => "E_DATABASE",
            Self::TransactionClosed { .. } => E_TRANSACTION_CLOSED,
            Self::Timeout { .. } => "E_TIMEOUT",
            Self::InvalidInput { .. } => "E_INVALID_INPUT",
            Self::MultipleStatements { .. } => "E_MULTIPLE_STATEMENTS",
            Self::Work { .. } => "E_WORK",
            Self::RollbackFailed { cause, .. } => cause.code(),
            Self::Internal { .. } => "E_INTERNAL",
        }
    }

    /// The error that originated a failure.
    ///
    /// For `RollbackFailed` this is the work or commit error, otherwise `self`.
    pub fn cause(&self) -> &DbError {
        match self {
            Self::RollbackFailed { cause, .. } => cause.cause(),
            _ => self,
        }
    }

    /// The rollback failure, when a rollback could not be issued.
    pub fn rollback_error(&self) -> Option<&DbError> {
        match self {
            Self::RollbackFailed { rollback, .. } => Some(rollback.as_ref()),
            _ => None,
        }
    }

    /// Check whether this error reports use of a settled transaction scope.
    pub fn is_transaction_closed(&self) -> bool {
        matches!(self.cause(), Self::TransactionClosed { .. })
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            Self::TransactionClosed { .. } => {
                Some("Issue queries only from inside the transaction callback")
            }
            Self::MultipleStatements { .. } => {
                Some("Split the query or enable multiple statements in the pool options")
            }
            Self::RollbackFailed { cause, .. } => cause.suggestion(),
            _ => None,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection options and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let sql_state = db_err.code().map(|c| c.to_string());
                let errno = db_err
                    .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                    .map(|e| e.number());
                DbError::Database {
                    message: db_err.message().to_string(),
                    sql_state,
                    errno,
                    suggestion: "Check the SQL syntax and referenced objects".to_string(),
                }
            }
            sqlx::Error::RowNotFound => DbError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => DbError::Timeout {
                operation: "connection pool acquire".to_string(),
                limit_secs: None,
            },
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Create a new Database instance")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
