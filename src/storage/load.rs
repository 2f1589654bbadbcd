//! Rebuilding an index snapshot from the durable store.
//!
//! `lookup` and `export` commands run against whatever the last build
//! persisted; rows that fail to parse (a manually edited database, say) are
//! skipped with a warning rather than failing the load.

use std::net::Ipv6Addr;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use futures::TryStreamExt;
use log::warn;
use sqlx::{Pool, Row, Sqlite};

use crate::error_handling::DatabaseError;
use crate::index::{Ipv4Index, Ipv6Index, Snapshot, SnapshotMeta};
use crate::record::{prefix_mask, CountryCode, Ipv4Range, Ipv6Range, RangeMeta};
use crate::registry::Registry;
use crate::storage::insert::read_metadata;

/// Loads the persisted ranges and metadata into a fresh snapshot.
pub async fn load_snapshot(pool: &Pool<Sqlite>) -> Result<Snapshot, DatabaseError> {
    let mut v4 = Vec::new();
    let mut rows = sqlx::query(
        "SELECT start_ip, end_ip, country_code, registry, date_allocated, status
         FROM ipv4_ranges ORDER BY id",
    )
    .fetch(pool);
    while let Some(row) = rows.try_next().await? {
        let start: i64 = row.get("start_ip");
        let end: i64 = row.get("end_ip");
        let Some(meta) = row_meta(&row) else { continue };
        if !(0..=u32::MAX as i64).contains(&start) || !(start..=u32::MAX as i64).contains(&end) {
            warn!("Skipping stored IPv4 range with invalid bounds {start}..{end}");
            continue;
        }
        v4.push(Ipv4Range {
            start: start as u32,
            end: end as u32,
            meta,
        });
    }
    drop(rows);

    let mut v6 = Vec::new();
    let mut rows = sqlx::query(
        "SELECT network, prefix_length, country_code, registry, date_allocated, status
         FROM ipv6_ranges ORDER BY id",
    )
    .fetch(pool);
    while let Some(row) = rows.try_next().await? {
        let network: String = row.get("network");
        let prefix_length: i64 = row.get("prefix_length");
        let Some(meta) = row_meta(&row) else { continue };
        let (Ok(addr), true) = (network.parse::<Ipv6Addr>(), (0..=128).contains(&prefix_length))
        else {
            warn!("Skipping stored IPv6 range {network}/{prefix_length}");
            continue;
        };
        let prefix_len = prefix_length as u8;
        v6.push(Ipv6Range {
            network: u128::from(addr) & prefix_mask(prefix_len),
            prefix_len,
            meta,
        });
    }
    drop(rows);

    let built_at = match read_metadata(pool, "last_updated").await? {
        Some(value) => DateTime::parse_from_rfc3339(&value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        None => Utc::now(),
    };
    let registries = match read_metadata(pool, "registry_outcomes").await? {
        Some(json) => serde_json::from_str(&json).unwrap_or_default(),
        None => Vec::new(),
    };

    let meta = SnapshotMeta {
        built_at,
        ipv4_count: v4.len(),
        ipv6_count: v6.len(),
        registries,
    };

    Ok(Snapshot {
        v4: Ipv4Index::build(v4),
        v6: Ipv6Index::build(v6),
        meta,
    })
}

fn row_meta(row: &sqlx::sqlite::SqliteRow) -> Option<RangeMeta> {
    let country_code: String = row.get("country_code");
    let registry: String = row.get("registry");
    let date_allocated: Option<String> = row.get("date_allocated");
    let status: String = row.get("status");

    let Some(country) = CountryCode::parse(&country_code) else {
        warn!("Skipping stored range with country code {country_code:?}");
        return None;
    };
    let Ok(registry) = Registry::from_str(&registry) else {
        warn!("Skipping stored range with registry {registry:?}");
        return None;
    };
    let date = date_allocated.and_then(|d| NaiveDate::parse_from_str(&d, "%Y%m%d").ok());

    Some(RangeMeta {
        country,
        registry,
        date,
        status,
    })
}
