//! db-access - Main entry point.
//!
//! Runs named-parameter SQL statements against MySQL and prints each result
//! as a JSON array of rows on stdout. Logs go to stderr.

use db_access_layer::config::Config;
use db_access_layer::{Bindings, Database, DbError, DbResult, Rows};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn print_rows(rows: &Rows) -> DbResult<()> {
    let json = serde_json::to_string(rows)
        .map_err(|e| DbError::internal(format!("Failed to serialize rows: {e}")))?;
    println!("{json}");
    Ok(())
}

async fn execute(db: &Database, config: &Config, bindings: Option<&Bindings>) -> DbResult<()> {
    if config.transaction {
        let statements = &config.sql;
        let results = db
            .transaction(|tx| async move {
                let mut results = Vec::with_capacity(statements.len());
                for sql in statements {
                    results.push(tx.query(sql, bindings).await?);
                }
                Ok(results)
            })
            .await?;
        for rows in &results {
            print_rows(rows)?;
        }
    } else {
        for sql in &config.sql {
            let rows = db.query(sql, bindings).await?;
            debug!(rows = rows.len(), "Statement complete");
            print_rows(&rows)?;
        }
    }
    Ok(())
}

async fn run(config: &Config) -> DbResult<()> {
    let bindings = config.bindings().map_err(DbError::invalid_input)?;
    let bindings = (!bindings.is_empty()).then_some(&bindings);
    let options = config.database_options().map_err(DbError::invalid_input)?;
    let db = Database::new(options)?;

    if config.dry_run {
        for sql in &config.sql {
            println!("{}", db.query_format(sql, bindings));
        }
        return Ok(());
    }

    info!(
        statements = config.sql.len(),
        transaction = config.transaction,
        "Running statements"
    );

    let result = execute(&db, config, bindings).await;
    db.end().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    // Initialize logging
    init_tracing(&config);

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.code(), e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {suggestion}");
            }
            ExitCode::FAILURE
        }
    }
}
