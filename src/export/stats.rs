//! Per-country allocation statistics over the stored IPv4 ranges.

use anyhow::Result;
use csv::Writer;
use futures::TryStreamExt;
use sqlx::{Pool, Row, Sqlite};
use std::path::PathBuf;

use super::open_output;

/// Exports per-country, per-registry IPv4 allocation statistics to CSV,
/// largest address footprint first. Returns the number of rows written.
pub async fn export_stats(
    pool: &Pool<Sqlite>,
    output: Option<&PathBuf>,
) -> Result<usize> {
    let mut writer = Writer::from_writer(open_output(output)?);
    writer.write_record([
        "country_code",
        "allocation_count",
        "total_ips",
        "registry",
        "first_allocation",
        "last_allocation",
    ])?;

    let mut rows = sqlx::query(
        "SELECT country_code,
                COUNT(*) AS allocation_count,
                SUM(end_ip - start_ip + 1) AS total_ips,
                registry,
                MIN(date_allocated) AS first_allocation,
                MAX(date_allocated) AS last_allocation
         FROM ipv4_ranges
         GROUP BY country_code, registry
         ORDER BY total_ips DESC",
    )
    .fetch(pool);

    let mut row_count = 0;
    while let Some(row) = rows.try_next().await? {
        let country_code: String = row.get("country_code");
        let allocation_count: i64 = row.get("allocation_count");
        let total_ips: i64 = row.get("total_ips");
        let registry: String = row.get("registry");
        let first_allocation: Option<String> = row.get("first_allocation");
        let last_allocation: Option<String> = row.get("last_allocation");

        writer.write_record(&[
            country_code,
            allocation_count.to_string(),
            total_ips.to_string(),
            registry,
            first_allocation.unwrap_or_default(),
            last_allocation.unwrap_or_default(),
        ])?;
        row_count += 1;
    }

    writer.flush()?;
    Ok(row_count)
}
