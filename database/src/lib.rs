//! Database layer with SQLite

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::str::FromStr;
use mobileorder_core::{Error, Result};
use tracing::info;

// Export models and queries
pub mod models;
pub mod queries;

pub use models::*;

// Re-export sqlx types for convenience
pub use sqlx::{self, Pool as SqlxPool, Sqlite as SqlxSqlite};

// Embed migrations at compile time
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Database connection pool
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self> {
        info!(url = %database_url, "Connecting to database");

        // Make sure the parent directory of a file-backed database exists
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            let path = path.trim_start_matches("//");
            if !path.starts_with(":memory:") {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        info!(dir = ?parent, "Creating database directory");
                        std::fs::create_dir_all(parent).map_err(|e| {
                            Error::DatabaseError(format!(
                                "Failed to create database directory: {}",
                                e
                            ))
                        })?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| Error::DatabaseError(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| Error::DatabaseError(format!("Failed to connect: {}", e)))?;

        Ok(Self { pool })
    }

    /// Private in-memory database with migrations applied
    ///
    /// Every connection to `:memory:` opens a separate database, so the pool
    /// is pinned to a single connection that never expires.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| Error::DatabaseError(format!("Invalid database URL: {}", e)))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| Error::DatabaseError(format!("Failed to connect: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| Error::DatabaseError(format!("Failed to run migrations: {}", e)))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the database connection
    pub async fn close(self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Whether a sqlx error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
