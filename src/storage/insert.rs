//! Transactional persistence of a built snapshot.
//!
//! The whole range set is replaced inside one transaction, so readers of the
//! durable store see either the previous build or the new one, mirroring the
//! in-memory snapshot swap.

use chrono::Utc;
use log::info;
use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::config::INSERT_CHUNK_SIZE;
use crate::error_handling::DatabaseError;
use crate::index::Snapshot;
use crate::record::{Ipv4Range, Ipv6Range};

/// Replaces the stored ranges and metadata with the snapshot's contents.
pub async fn persist_snapshot(
    pool: &Pool<Sqlite>,
    snapshot: &Snapshot,
) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM ipv4_ranges")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM ipv6_ranges")
        .execute(&mut *tx)
        .await?;

    for chunk in snapshot.v4.ranges().chunks(INSERT_CHUNK_SIZE) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO ipv4_ranges (start_ip, end_ip, country_code, registry, date_allocated, status) ",
        );
        builder.push_values(chunk, |mut row, range: &Ipv4Range| {
            row.push_bind(range.start as i64)
                .push_bind(range.end as i64)
                .push_bind(range.meta.country.as_str().to_string())
                .push_bind(range.meta.registry.as_str())
                .push_bind(range.meta.date.map(|d| d.format("%Y%m%d").to_string()))
                .push_bind(range.meta.status.clone());
        });
        builder.build().execute(&mut *tx).await?;
    }

    let v6_ranges: Vec<&Ipv6Range> = snapshot.v6.ranges().collect();
    for chunk in v6_ranges.chunks(INSERT_CHUNK_SIZE) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO ipv6_ranges (network, prefix_length, country_code, registry, date_allocated, status) ",
        );
        builder.push_values(chunk, |mut row, range: &&Ipv6Range| {
            row.push_bind(range.network_addr().to_string())
                .push_bind(range.prefix_len as i64)
                .push_bind(range.meta.country.as_str().to_string())
                .push_bind(range.meta.registry.as_str())
                .push_bind(range.meta.date.map(|d| d.format("%Y%m%d").to_string()))
                .push_bind(range.meta.status.clone());
        });
        builder.build().execute(&mut *tx).await?;
    }

    let registry_outcomes =
        serde_json::to_string(&snapshot.meta.registries).unwrap_or_else(|_| "[]".to_string());
    let successful: Vec<String> = snapshot
        .meta
        .successful_registries()
        .iter()
        .map(|r| r.to_string())
        .collect();

    for (key, value) in [
        ("last_updated", Utc::now().to_rfc3339()),
        ("ipv4_count", snapshot.v4.len().to_string()),
        ("ipv6_count", snapshot.v6.len().to_string()),
        ("successful_registries", successful.join(",")),
        ("registry_outcomes", registry_outcomes),
    ] {
        sqlx::query(
            "INSERT OR REPLACE INTO metadata (key, value, updated_at)
             VALUES (?, ?, CURRENT_TIMESTAMP)",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        "Persisted {} IPv4 and {} IPv6 ranges",
        snapshot.v4.len(),
        snapshot.v6.len()
    );
    Ok(())
}

/// Reads one metadata value, if present.
pub async fn read_metadata(
    pool: &Pool<Sqlite>,
    key: &str,
) -> Result<Option<String>, DatabaseError> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(value)
}
