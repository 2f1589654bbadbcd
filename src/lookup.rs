//! Query-side facade over a published snapshot.
//!
//! Stateless: parses the query string, dispatches to the matching family's
//! index, and shapes the hit for callers. An unparseable address is a miss,
//! never an error.

use std::net::IpAddr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::index::Snapshot;
use crate::record::CountryCode;
use crate::registry::Registry;

/// One successful lookup.
#[derive(Clone, Debug, Serialize)]
pub struct LookupResult {
    pub address: String,
    pub country: CountryCode,
    pub registry: Registry,
    pub date_allocated: Option<NaiveDate>,
    pub status: String,
    pub ip_version: u8,
    /// The matched CIDR block, reported for IPv6 hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_network: Option<String>,
}

/// Resolves an address against the snapshot's indices.
///
/// Returns `None` for addresses outside every stored range and for input
/// that does not parse as an IP address at all.
pub fn lookup(snapshot: &Snapshot, address: &str) -> Option<LookupResult> {
    let addr: IpAddr = address.parse().ok()?;
    match addr {
        IpAddr::V4(v4) => {
            let range = snapshot.v4.lookup(u32::from(v4))?;
            Some(LookupResult {
                address: address.to_string(),
                country: range.meta.country,
                registry: range.meta.registry,
                date_allocated: range.meta.date,
                status: range.meta.status.clone(),
                ip_version: 4,
                matched_network: None,
            })
        }
        IpAddr::V6(v6) => {
            let range = snapshot.v6.lookup(u128::from(v6))?;
            Some(LookupResult {
                address: address.to_string(),
                country: range.meta.country,
                registry: range.meta.registry,
                date_allocated: range.meta.date,
                status: range.meta.status.clone(),
                ip_version: 6,
                matched_network: Some(format!("{}/{}", range.network_addr(), range.prefix_len)),
            })
        }
    }
}

/// Resolves a batch of addresses against one snapshot.
///
/// Results come back in input order, one per address, with `None` marking
/// misses and unparseable entries. All lookups run against the same
/// snapshot, so a concurrent rebuild cannot split a batch across versions.
pub fn lookup_many<'a, I>(snapshot: &Snapshot, addresses: I) -> Vec<Option<LookupResult>>
where
    I: IntoIterator<Item = &'a str>,
{
    addresses
        .into_iter()
        .map(|address| lookup(snapshot, address))
        .collect()
}
