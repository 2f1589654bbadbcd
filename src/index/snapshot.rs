//! Immutable index snapshots and atomic publication.
//!
//! A build produces a [`Snapshot`] (both indices plus build metadata) that is
//! never mutated afterwards. [`SnapshotStore`] holds the currently published
//! snapshot behind an `ArcSwap`: publishing is a single pointer swap, so a
//! reader sees either the old snapshot in its entirety or the new one, never
//! a mix, and lookups in flight keep their `Arc` until they finish.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::index::{Ipv4Index, Ipv6Index};
use crate::registry::Registry;

/// One fully-built, immutable version of the lookup index.
#[derive(Debug)]
pub struct Snapshot {
    pub v4: Ipv4Index,
    pub v6: Ipv6Index,
    pub meta: SnapshotMeta,
}

impl Snapshot {
    /// A published-but-empty snapshot: the valid "no data" state.
    pub fn empty() -> Snapshot {
        Snapshot {
            v4: Ipv4Index::default(),
            v6: Ipv6Index::default(),
            meta: SnapshotMeta::empty(),
        }
    }

    pub fn range_count(&self) -> usize {
        self.v4.len() + self.v6.len()
    }
}

/// Build metadata carried by every snapshot.
#[derive(Clone, Debug, Serialize)]
pub struct SnapshotMeta {
    pub built_at: DateTime<Utc>,
    pub ipv4_count: usize,
    pub ipv6_count: usize,
    pub registries: Vec<RegistryOutcome>,
}

impl SnapshotMeta {
    fn empty() -> SnapshotMeta {
        SnapshotMeta {
            built_at: Utc::now(),
            ipv4_count: 0,
            ipv6_count: 0,
            registries: Vec::new(),
        }
    }

    /// Registries that contributed ranges to this snapshot.
    pub fn successful_registries(&self) -> Vec<Registry> {
        self.registries
            .iter()
            .filter(|o| o.available)
            .map(|o| o.registry)
            .collect()
    }
}

/// Per-registry outcome of one build pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryOutcome {
    pub registry: Registry,
    /// False when the provider reported the registry unavailable; the
    /// registry then contributed zero ranges and the build went on.
    pub available: bool,
    pub ranges: usize,
}

/// Owner of the currently published snapshot pointer.
///
/// `publish` is an atomic swap; `current` hands a caller its own `Arc`, so a
/// superseded snapshot is reclaimed once the last in-flight lookup drops it.
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
}

impl SnapshotStore {
    /// Starts with an empty snapshot so lookups are valid before any build.
    pub fn new() -> SnapshotStore {
        SnapshotStore {
            current: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    /// Atomically replaces the published snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        self.current.store(Arc::new(snapshot));
    }

    /// The currently published snapshot. Callers hold the returned `Arc`
    /// only for the duration of a query.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
