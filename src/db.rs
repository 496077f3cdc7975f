use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

use crate::queries::ddl;

/// Open the file-backed database for production use
/// Enables WAL mode and creates the file if missing
pub async fn open_database(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create both tables and the candidate lookup index if absent
/// Runs at every process start
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(&ddl::create_recordings_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_interview_data_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_recordings_candidate_index())
        .execute(pool)
        .await?;
    Ok(())
}

/// Create an in-memory database for testing
/// Single connection so every query sees the same database
pub async fn open_in_memory() -> SqlitePool {
    let options =
        SqliteConnectOptions::from_str("sqlite::memory:").expect("in-memory connect options");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory database");
    init_schema(&pool).await.expect("Failed to create schema");
    pool
}
