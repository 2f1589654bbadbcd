//! The interval resolution index: IPv4 intervals, IPv6 prefixes, and the
//! snapshot/version machinery that publishes them atomically.

pub mod ipv4;
pub mod ipv6;
pub mod snapshot;

pub use ipv4::Ipv4Index;
pub use ipv6::Ipv6Index;
pub use snapshot::{RegistryOutcome, Snapshot, SnapshotMeta, SnapshotStore};
