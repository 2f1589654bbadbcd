//! ip_country library: IP-to-country resolution from RIR delegation data.
//!
//! This library downloads the delegated-extended statistics files published
//! by the five regional internet registries, normalizes them into canonical
//! address ranges, and builds an in-memory index that resolves any IPv4 or
//! IPv6 address to its allocated country. Built indices are persisted to
//! SQLite so later lookups and exports work without re-downloading.
//!
//! # Example
//!
//! ```no_run
//! use ip_country::{lookup, IndexBuilder, Registry};
//!
//! let mut builder = IndexBuilder::new();
//! builder.ingest_registry(
//!     Registry::Arin,
//!     "arin|US|ipv4|8.8.8.0|256|20140328|allocated\n",
//! );
//! let snapshot = builder.build();
//!
//! if let Some(result) = lookup(&snapshot, "8.8.8.8") {
//!     println!("{} -> {}", result.address, result.country.as_str());
//! }
//! ```

pub mod build;
pub mod config;
pub mod error_handling;
pub mod export;
pub mod fetch;
pub mod index;
pub mod lookup;
pub mod record;
pub mod registry;
pub mod storage;

// Re-export public API
pub use build::{run_build, IndexBuilder};
pub use config::{Command, LogLevel, Opt};
pub use fetch::{DirProvider, HttpProvider, Provider};
pub use index::{Ipv4Index, Ipv6Index, RegistryOutcome, Snapshot, SnapshotMeta, SnapshotStore};
pub use lookup::{lookup, lookup_many, LookupResult};
pub use record::{CountryCode, DelegationRecord};
pub use registry::{Registry, RegistrySource};
