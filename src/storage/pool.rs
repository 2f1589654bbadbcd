//! SQLite connection pool for the range store.

use std::path::Path;
use std::sync::Arc;

use log::{debug, error};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Pool, Sqlite, SqlitePool};

use crate::error_handling::DatabaseError;

/// Opens a pool on the range database at `db_path`, creating the file on
/// first use. WAL mode keeps lookups readable while a build rewrites the
/// range tables.
pub async fn init_db_pool_with_path(
    db_path: &Path,
) -> Result<Arc<Pool<Sqlite>>, DatabaseError> {
    debug!("Opening range database at {}", db_path.display());
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePool::connect_with(options).await.map_err(|e| {
        error!("Could not open range database {}: {e}", db_path.display());
        DatabaseError::SqlError(e)
    })?;

    Ok(Arc::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_creates_database_file_in_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ranges.db");
        assert!(!db_path.exists());

        let pool = init_db_pool_with_path(&db_path).await.unwrap();
        assert!(db_path.exists());

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&*pool)
            .await
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[tokio::test]
    async fn test_pool_reopens_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ranges.db");

        {
            let pool = init_db_pool_with_path(&db_path).await.unwrap();
            sqlx::query("CREATE TABLE marker (n INTEGER)")
                .execute(&*pool)
                .await
                .unwrap();
        }

        let pool = init_db_pool_with_path(&db_path).await.unwrap();
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='marker'",
        )
        .fetch_one(&*pool)
        .await
        .unwrap();
        assert_eq!(tables, 1);
    }
}
