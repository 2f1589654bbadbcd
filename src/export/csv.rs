//! CSV export of the stored ranges.
//!
//! IPv4 rows come out ordered by range start, IPv6 rows by network and
//! prefix length, so downstream consumers can binary-search the flat file.

use anyhow::Result;
use csv::Writer;
use futures::TryStreamExt;
use sqlx::{Pool, Row, Sqlite};
use std::path::PathBuf;

use super::open_output;

/// Exports IPv4 ranges to CSV. Returns the number of rows written.
pub async fn export_csv(
    pool: &Pool<Sqlite>,
    output: Option<&PathBuf>,
) -> Result<usize> {
    let mut writer = Writer::from_writer(open_output(output)?);
    writer.write_record([
        "start_ip",
        "end_ip",
        "country_code",
        "registry",
        "date_allocated",
        "status",
    ])?;

    let mut rows = sqlx::query(
        "SELECT start_ip, end_ip, country_code, registry, date_allocated, status
         FROM ipv4_ranges ORDER BY start_ip",
    )
    .fetch(pool);

    let mut row_count = 0;
    while let Some(row) = rows.try_next().await? {
        let start_ip: i64 = row.get("start_ip");
        let end_ip: i64 = row.get("end_ip");
        let country_code: String = row.get("country_code");
        let registry: String = row.get("registry");
        let date_allocated: Option<String> = row.get("date_allocated");
        let status: String = row.get("status");

        writer.write_record(&[
            start_ip.to_string(),
            end_ip.to_string(),
            country_code,
            registry,
            date_allocated.unwrap_or_default(),
            status,
        ])?;
        row_count += 1;
    }

    writer.flush()?;
    Ok(row_count)
}

/// Exports IPv6 prefixes to CSV. Returns the number of rows written.
pub async fn export_csv_v6(
    pool: &Pool<Sqlite>,
    output: Option<&PathBuf>,
) -> Result<usize> {
    let mut writer = Writer::from_writer(open_output(output)?);
    writer.write_record([
        "network",
        "prefix_length",
        "country_code",
        "registry",
        "date_allocated",
        "status",
    ])?;

    let mut rows = sqlx::query(
        "SELECT network, prefix_length, country_code, registry, date_allocated, status
         FROM ipv6_ranges ORDER BY network, prefix_length",
    )
    .fetch(pool);

    let mut row_count = 0;
    while let Some(row) = rows.try_next().await? {
        let network: String = row.get("network");
        let prefix_length: i64 = row.get("prefix_length");
        let country_code: String = row.get("country_code");
        let registry: String = row.get("registry");
        let date_allocated: Option<String> = row.get("date_allocated");
        let status: String = row.get("status");

        writer.write_record(&[
            network,
            prefix_length.to_string(),
            country_code,
            registry,
            date_allocated.unwrap_or_default(),
            status,
        ])?;
        row_count += 1;
    }

    writer.flush()?;
    Ok(row_count)
}
