// Shared test helpers for database setup and sample delegation data.

use sqlx::SqlitePool;
use std::path::Path;

use ip_country::storage::create_tables;

/// A small ARIN delegated-extended file: version header, summary row, two
/// IPv4 allocations, an ASN row, and one IPv6 allocation.
#[allow(dead_code)] // Used by other test files
pub const ARIN_SAMPLE: &str = "\
2|arin|20250829|5|19700101|20250829|-0500
arin|*|ipv4|*|2|summary
arin|US|ipv4|8.8.8.0|256|20140328|allocated
arin|CA|ipv4|24.0.0.0|65536|19961212|allocated
arin|US|asn|15169|1|20000320|assigned
arin|US|ipv6|2620:0:1000::|40|20081222|allocated
";

/// A small RIPE NCC file with nested IPv6 prefixes (a /26 containing a /32)
/// to exercise longest-prefix matching end to end.
#[allow(dead_code)]
pub const RIPENCC_SAMPLE: &str = "\
2|ripencc|20250829|3|19700101|20250829|+0100
ripencc|FR|ipv4|2.0.0.0|1048576|20100712|allocated
ripencc|FR|ipv6|2a01:e00::|26|20071227|allocated
ripencc|DE|ipv6|2a01:e00::|32|20120503|allocated
";

/// Creates an in-memory test database pool with the range tables created.
#[allow(dead_code)]
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    create_tables(&pool)
        .await
        .expect("Failed to create tables");
    pool
}

/// Writes ARIN and RIPE NCC sample files into `dir` under the
/// `delegated-<rir>-extended-latest` names the directory provider expects.
/// The other three registries are deliberately absent.
#[allow(dead_code)]
pub fn write_delegation_files(dir: &Path) {
    std::fs::write(dir.join("delegated-arin-extended-latest"), ARIN_SAMPLE)
        .expect("Failed to write arin sample");
    std::fs::write(
        dir.join("delegated-ripencc-extended-latest"),
        RIPENCC_SAMPLE,
    )
    .expect("Failed to write ripencc sample");
}
