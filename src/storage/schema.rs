// storage/schema.rs
// Table and index creation

use sqlx::{Pool, Sqlite};

use crate::error_handling::DatabaseError;

/// Creates the range and metadata tables if they don't exist.
pub async fn create_tables(pool: &Pool<Sqlite>) -> Result<(), DatabaseError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS ipv4_ranges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_ip INTEGER NOT NULL,
            end_ip INTEGER NOT NULL,
            country_code TEXT NOT NULL,
            registry TEXT NOT NULL,
            date_allocated TEXT,
            status TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS ipv6_ranges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            network TEXT NOT NULL,
            prefix_length INTEGER NOT NULL,
            country_code TEXT NOT NULL,
            registry TEXT NOT NULL,
            date_allocated TEXT,
            status TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    // Lookup and export both read ranges ordered by start.
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ipv4_start ON ipv4_ranges(start_ip)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ipv4_country ON ipv4_ranges(country_code)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ipv6_network ON ipv6_ranges(network)")
        .execute(pool)
        .await?;

    Ok(())
}
