//! The build pass: registries in, published snapshot out.
//!
//! One pass walks the configured registry sources, normalizes and
//! canonicalizes every line, and accumulates canonical ranges. Nothing the
//! input does short of total absence is fatal: malformed lines and
//! unavailable registries are counted and skipped, and even an empty
//! accumulation publishes a valid (empty) snapshot.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info, warn};
use sqlx::{Pool, Sqlite};

use crate::error_handling::RejectStats;
use crate::fetch::Provider;
use crate::index::{Ipv4Index, Ipv6Index, RegistryOutcome, Snapshot, SnapshotMeta, SnapshotStore};
use crate::record::{CanonicalEntry, DelegationRecord, Ipv4Range, Ipv6Range};
use crate::registry::{Registry, RegistrySource};
use crate::storage::{create_tables, persist_snapshot};

/// Accumulates canonical ranges across registries, then builds a snapshot.
///
/// Owns its buffers exclusively until [`IndexBuilder::build`] transfers them
/// into the finished snapshot. Dropping a builder mid-pass abandons the
/// build with no effect on anything published.
pub struct IndexBuilder {
    v4: Vec<Ipv4Range>,
    v6: Vec<Ipv6Range>,
    outcomes: Vec<RegistryOutcome>,
    rejects: Arc<RejectStats>,
}

impl IndexBuilder {
    pub fn new() -> IndexBuilder {
        IndexBuilder {
            v4: Vec::new(),
            v6: Vec::new(),
            outcomes: Vec::new(),
            rejects: Arc::new(RejectStats::new()),
        }
    }

    /// Ingests one registry's raw delegation text, in file order, appending
    /// ranges in accumulation order (last write wins at lookup time).
    pub fn ingest_registry(&mut self, registry: Registry, text: &str) {
        let before = self.v4.len() + self.v6.len();

        for line in text.lines() {
            let Some(record) = DelegationRecord::parse_counted(line, registry, &self.rejects)
            else {
                continue;
            };
            match record.canonicalize() {
                Ok(CanonicalEntry::V4(range)) => self.v4.push(range),
                Ok(CanonicalEntry::V6(range)) => self.v6.push(range),
                Err(reason) => {
                    self.rejects.increment(reason);
                    debug!("Dropped {} record: {}: {:?}", registry, reason.as_str(), line);
                }
            }
        }

        let ranges = self.v4.len() + self.v6.len() - before;
        info!("Accumulated {} ranges from {}", ranges, registry);
        self.outcomes.push(RegistryOutcome {
            registry,
            available: true,
            ranges,
        });
    }

    /// Records a registry the provider could not supply.
    pub fn registry_unavailable(&mut self, registry: Registry) {
        warn!("Registry {} unavailable; continuing without it", registry);
        self.outcomes.push(RegistryOutcome {
            registry,
            available: false,
            ranges: 0,
        });
    }

    pub fn reject_stats(&self) -> &RejectStats {
        &self.rejects
    }

    /// Constructs both indices and the snapshot metadata, consuming the
    /// accumulation buffers.
    pub fn build(self) -> Snapshot {
        let meta = SnapshotMeta {
            built_at: Utc::now(),
            ipv4_count: self.v4.len(),
            ipv6_count: self.v6.len(),
            registries: self.outcomes,
        };
        Snapshot {
            v4: Ipv4Index::build(self.v4),
            v6: Ipv6Index::build(self.v6),
            meta,
        }
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one full build pass and publishes the result.
///
/// Fetches every source through `provider`, accumulates, builds, publishes
/// the snapshot to `store`, and persists it to `pool`. Per-registry fetch
/// failures are non-fatal; only a storage failure aborts (leaving the
/// previously published snapshot untouched).
pub async fn run_build<P: Provider>(
    sources: &[RegistrySource],
    provider: &P,
    store: &SnapshotStore,
    pool: &Pool<Sqlite>,
) -> Result<Arc<Snapshot>> {
    let start_time = Instant::now();
    let mut builder = IndexBuilder::new();

    for source in sources {
        match provider.fetch(source).await {
            Some(text) => builder.ingest_registry(source.registry, &text),
            None => builder.registry_unavailable(source.registry),
        }
    }

    let rejected = builder.reject_stats().total();
    if rejected > 0 {
        info!("Dropped {} malformed records during the pass", rejected);
    }

    let snapshot = builder.build();
    if snapshot.range_count() == 0 {
        warn!("Build accumulated zero ranges; publishing an empty snapshot");
    }

    create_tables(pool)
        .await
        .context("Failed to create range tables")?;
    persist_snapshot(pool, &snapshot)
        .await
        .context("Failed to persist the built snapshot")?;

    store.publish(snapshot);
    let published = store.current();

    info!(
        "Build published {} IPv4 and {} IPv6 ranges from {} registries in {:.1}s",
        published.meta.ipv4_count,
        published.meta.ipv6_count,
        published.meta.successful_registries().len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(published)
}
