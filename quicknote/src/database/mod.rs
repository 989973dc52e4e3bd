//! Database module
//!
//! SQLite persistence for the note collection:
//! - Schema and migrations
//! - The `Note` model and its guarded editor
//! - The `NoteBackend` contract the store writes through, and `Repository`,
//!   its SQLite implementation

pub mod backend;
pub mod models;
pub mod repository;
pub mod schema;

pub use backend::NoteBackend;
pub use models::*;
pub use repository::Repository;
pub use schema::{initialize_database, schema_version};

use crate::config::{DB_BUSY_TIMEOUT_SECS, DB_MAX_CONNECTIONS};
use crate::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

fn connect_options(db_path: &Path) -> std::result::Result<SqliteConnectOptions, sqlx::Error> {
    SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display())).map(
        |opts| {
            opts.create_if_missing(true)
                .busy_timeout(Duration::from_secs(DB_BUSY_TIMEOUT_SECS))
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        },
    )
}

/// Create the note database at `db_path` if needed, migrate it, and open
/// the application pool.
///
/// Migrations run on their own single connection, closed before the
/// application pool opens, so no pooled connection predates the schema.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Opening note database at: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let migration_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(db_path)?)
        .await?;

    initialize_database(&migration_pool).await?;
    migration_pool.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(DB_MAX_CONNECTIONS)
        .connect_with(connect_options(db_path)?)
        .await?;

    tracing::info!(
        "Note database ready, schema version {}",
        schema_version(&pool).await?
    );

    Ok(pool)
}

/// Open the note database, treating any failure as unrecoverable.
pub async fn open_repository(db_path: &Path) -> Result<Repository> {
    let pool = create_pool(db_path).await.map_err(|e| {
        tracing::error!("Failed to open note database at {:?}: {}", db_path, e);
        match e {
            AppError::Unresolvable(_) => e,
            other => AppError::Unresolvable(format!("{}: {}", db_path.display(), other)),
        }
    })?;

    Ok(Repository::new(pool))
}

/// Single-connection in-memory pool. Every connection to `sqlite::memory:`
/// is its own database, so tests must not open a second one.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}
