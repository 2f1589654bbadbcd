use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;
use tokio_retry::strategy::ExponentialBackoff;

use crate::config::{RETRY_FACTOR, RETRY_INITIAL_DELAY_MS, RETRY_MAX_DELAY_SECS};

/// Error types for registry data retrieval.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP transport or status failure.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Local file read failure.
    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// Why a delegation record was excluded from the build.
///
/// Categories mirror the pipeline stages: the first group is silent
/// normalization rejection, the second is canonicalization failure on an
/// otherwise accepted record. None of these is fatal to a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum RejectReason {
    // Normalization
    TruncatedLine,
    BadCountryCode,
    // Canonicalization
    BadIpv4Address,
    BadIpv4Count,
    Ipv4Overflow,
    BadIpv6Address,
    BadIpv6Prefix,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::TruncatedLine => "truncated field list",
            RejectReason::BadCountryCode => "wildcard or malformed country code",
            RejectReason::BadIpv4Address => "unparseable IPv4 address",
            RejectReason::BadIpv4Count => "bad IPv4 address count",
            RejectReason::Ipv4Overflow => "IPv4 range exceeds address space",
            RejectReason::BadIpv6Address => "unparseable IPv6 address",
            RejectReason::BadIpv6Prefix => "IPv6 prefix length out of range",
        }
    }
}

/// Thread-safe reject counters, one per [`RejectReason`].
///
/// Shared across the build pass via `Arc`; counters are atomic so the
/// accounting never perturbs the pipeline.
pub struct RejectStats {
    rejects: HashMap<RejectReason, AtomicUsize>,
}

impl RejectStats {
    pub fn new() -> Self {
        let mut rejects = HashMap::new();
        for reason in RejectReason::iter() {
            rejects.insert(reason, AtomicUsize::new(0));
        }
        RejectStats { rejects }
    }

    pub fn increment(&self, reason: RejectReason) {
        // All RejectReason variants are initialized in new(), so unwrap() is safe
        self.rejects
            .get(&reason)
            .unwrap()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_count(&self, reason: RejectReason) -> usize {
        self.rejects.get(&reason).unwrap().load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        RejectReason::iter().map(|r| self.get_count(r)).sum()
    }
}

impl Default for RejectStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates the exponential backoff strategy used for registry downloads.
pub fn get_retry_strategy() -> ExponentialBackoff {
    ExponentialBackoff::from_millis(RETRY_INITIAL_DELAY_MS)
        .factor(RETRY_FACTOR)
        .max_delay(Duration::from_secs(RETRY_MAX_DELAY_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_stats_initialization() {
        let stats = RejectStats::new();
        for reason in RejectReason::iter() {
            assert_eq!(stats.get_count(reason), 0);
        }
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_reject_stats_increment() {
        let stats = RejectStats::new();
        stats.increment(RejectReason::Ipv4Overflow);
        stats.increment(RejectReason::Ipv4Overflow);
        stats.increment(RejectReason::BadIpv6Prefix);
        assert_eq!(stats.get_count(RejectReason::Ipv4Overflow), 2);
        assert_eq!(stats.get_count(RejectReason::BadIpv6Prefix), 1);
        assert_eq!(stats.get_count(RejectReason::BadIpv4Address), 0);
        assert_eq!(stats.total(), 3);
    }
}
