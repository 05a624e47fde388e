//! Database module for SQLite persistence
//!
//! Handles accounts, issued tokens, documents and their derived text.

mod documents;
mod processed;
mod schema;
mod users;

pub use documents::*;
pub use processed::*;
pub use schema::*;
pub use users::*;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Create a new database connection pool
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run migrations
    initialize_schema(&pool).await?;

    Ok(pool)
}

/// Timestamp format used for every stored date (sorts lexicographically)
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now() -> String {
    timestamp(Utc::now())
}

fn pages_to_json(pages: &[u32]) -> Result<String> {
    Ok(serde_json::to_string(pages)?)
}

fn pages_from_json(raw: &str) -> Result<Vec<u32>> {
    Ok(serde_json::from_str(raw)?)
}

fn corrupt(what: &str, err: String) -> AppError {
    AppError::Internal(format!("Corrupt {} column: {}", what, err))
}
