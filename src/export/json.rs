//! JSON export of the IPv4 range set.

use anyhow::Result;
use futures::TryStreamExt;
use serde::Serialize;
use sqlx::{Pool, Row, Sqlite};
use std::io::Write;
use std::path::PathBuf;

use super::open_output;

#[derive(Serialize)]
struct JsonRange {
    start: i64,
    end: i64,
    country: String,
}

/// Exports IPv4 ranges as a JSON array of `{start, end, country}` objects,
/// ordered by range start. Returns the number of ranges written.
pub async fn export_json(
    pool: &Pool<Sqlite>,
    output: Option<&PathBuf>,
) -> Result<usize> {
    let mut rows = sqlx::query(
        "SELECT start_ip, end_ip, country_code FROM ipv4_ranges ORDER BY start_ip",
    )
    .fetch(pool);

    let mut ranges = Vec::new();
    while let Some(row) = rows.try_next().await? {
        ranges.push(JsonRange {
            start: row.get("start_ip"),
            end: row.get("end_ip"),
            country: row.get("country_code"),
        });
    }

    let mut writer = open_output(output)?;
    serde_json::to_writer_pretty(&mut writer, &ranges)?;
    writer.flush()?;
    Ok(ranges.len())
}
