//! Delegation record normalization and range canonicalization.
//!
//! A delegated-extended file is pipe-delimited, one allocation per line:
//!
//! ```text
//! arin|US|ipv4|8.8.8.0|256|20140328|allocated
//! ripencc|FR|ipv6|2a01:e00::|32||allocated
//! ```
//!
//! [`DelegationRecord::parse`] turns one line into a typed record or rejects
//! it silently (header, summary, and non-country rows carry no allocation).
//! [`DelegationRecord::canonicalize`] turns an accepted record into a
//! [`CanonicalEntry`] ready for indexing, or fails with a reason that the
//! build pass counts without aborting.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error_handling::{RejectReason, RejectStats};
use crate::registry::Registry;

/// A validated ISO 3166 style two-letter country code, stored uppercase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// Accepts exactly two ASCII letters, in any case. The wildcard marker
    /// (`*`) and anything else fails.
    pub fn parse(s: &str) -> Option<CountryCode> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        Some(CountryCode([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }

    pub fn as_str(&self) -> &str {
        // Invariant: constructed from two ASCII letters.
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CountryCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One accepted delegation line, before address parsing.
///
/// Transient: consumed by [`DelegationRecord::canonicalize`] and discarded.
#[derive(Clone, Debug)]
pub struct DelegationRecord {
    pub registry: Registry,
    pub country: CountryCode,
    pub family: AddressFamily,
    /// Start address, still textual.
    pub start: String,
    /// IPv4: address count. IPv6: prefix length. Still textual.
    pub value: String,
    pub date: Option<NaiveDate>,
    pub status: String,
}

/// Address family tag of a delegation line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl DelegationRecord {
    /// Parses one line of a delegated-extended file.
    ///
    /// Returns `None` for lines that carry no country allocation: blank
    /// lines, `#` comments, version/summary headers (fewer than 7 fields or
    /// a non-IP type field), wildcard or malformed country codes, and `asn`
    /// rows. No rejection here is an error.
    pub fn parse(line: &str, registry: Registry) -> Option<DelegationRecord> {
        Self::parse_inner(line, registry).ok()
    }

    /// Like [`DelegationRecord::parse`], but counts malformed lines
    /// (truncated field lists, bad country codes) in `stats`. Well-formed
    /// rows the index has no use for (comments, summaries, `asn`) stay
    /// uncounted.
    pub(crate) fn parse_counted(
        line: &str,
        registry: Registry,
        stats: &RejectStats,
    ) -> Option<DelegationRecord> {
        match Self::parse_inner(line, registry) {
            Ok(record) => Some(record),
            Err(Some(reason)) => {
                stats.increment(reason);
                None
            }
            Err(None) => None,
        }
    }

    fn parse_inner(
        line: &str,
        registry: Registry,
    ) -> Result<DelegationRecord, Option<RejectReason>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Err(None);
        }

        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < 7 {
            // Version headers and summary rows have fewer fields by format;
            // only record-shaped lines count as truncated.
            let is_header = fields.len() <= 1
                || fields.get(1) == Some(&"*")
                || fields.last() == Some(&"summary");
            return Err(if is_header {
                None
            } else {
                Some(RejectReason::TruncatedLine)
            });
        }

        // The version header's first field is the format version number.
        if fields[0].bytes().all(|b| b.is_ascii_digit()) {
            return Err(None);
        }

        // Summary rows carry the wildcard marker; they are dropped silently,
        // while a malformed code on a record row is counted.
        let country = match CountryCode::parse(fields[1]) {
            Some(country) => country,
            None if fields[1] == "*" => return Err(None),
            None => return Err(Some(RejectReason::BadCountryCode)),
        };

        let family = match fields[2] {
            "ipv4" => AddressFamily::Ipv4,
            "ipv6" => AddressFamily::Ipv6,
            _ => return Err(None),
        };

        // A malformed date is not fatal to an otherwise valid allocation:
        // clear it rather than dropping the record.
        let date = match fields[5] {
            d if d.len() == 8 => NaiveDate::parse_from_str(d, "%Y%m%d").ok(),
            _ => None,
        };

        Ok(DelegationRecord {
            registry,
            country,
            family,
            start: fields[3].to_string(),
            value: fields[4].to_string(),
            date,
            status: fields[6].to_string(),
        })
    }

    /// Converts this record into a canonical range.
    ///
    /// IPv4 interprets `value` as an address count; IPv6 as a prefix length.
    pub fn canonicalize(self) -> Result<CanonicalEntry, RejectReason> {
        let meta = RangeMeta {
            country: self.country,
            registry: self.registry,
            date: self.date,
            status: self.status,
        };
        match self.family {
            AddressFamily::Ipv4 => {
                let start: Ipv4Addr = self
                    .start
                    .parse()
                    .map_err(|_| RejectReason::BadIpv4Address)?;
                let count: u64 = match self.value.parse() {
                    Ok(0) | Err(_) => return Err(RejectReason::BadIpv4Count),
                    Ok(n) => n,
                };
                let start = u32::from(start);
                // count can be anything u64 holds; the sum must stay checked.
                let end = (start as u64)
                    .checked_add(count - 1)
                    .filter(|end| *end <= u32::MAX as u64)
                    .ok_or(RejectReason::Ipv4Overflow)?;
                Ok(CanonicalEntry::V4(Ipv4Range {
                    start,
                    end: end as u32,
                    meta,
                }))
            }
            AddressFamily::Ipv6 => {
                let addr: Ipv6Addr = self
                    .start
                    .parse()
                    .map_err(|_| RejectReason::BadIpv6Address)?;
                let prefix_len: u8 = self
                    .value
                    .parse()
                    .ok()
                    .filter(|len| *len <= 128)
                    .ok_or(RejectReason::BadIpv6Prefix)?;
                Ok(CanonicalEntry::V6(Ipv6Range {
                    network: u128::from(addr) & prefix_mask(prefix_len),
                    prefix_len,
                    meta,
                }))
            }
        }
    }
}

/// The network mask for a prefix length, as a 128-bit value.
pub fn prefix_mask(prefix_len: u8) -> u128 {
    match prefix_len {
        0 => 0,
        len => u128::MAX << (128 - len as u32),
    }
}

/// Attributes shared by both range families.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeMeta {
    pub country: CountryCode,
    pub registry: Registry,
    pub date: Option<NaiveDate>,
    pub status: String,
}

/// A canonical IPv4 allocation: a closed interval of 32-bit addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ipv4Range {
    pub start: u32,
    pub end: u32,
    pub meta: RangeMeta,
}

impl Ipv4Range {
    pub fn contains(&self, addr: u32) -> bool {
        self.start <= addr && addr <= self.end
    }

    /// Interval width, used for the narrowest-match tie-break.
    pub fn width(&self) -> u32 {
        self.end - self.start
    }
}

/// A canonical IPv6 allocation: a CIDR block with host bits cleared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ipv6Range {
    pub network: u128,
    pub prefix_len: u8,
    pub meta: RangeMeta,
}

impl Ipv6Range {
    pub fn network_addr(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.network)
    }
}

/// A canonical range, tagged by address family.
#[derive(Clone, Debug)]
pub enum CanonicalEntry {
    V4(Ipv4Range),
    V6(Ipv6Range),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_v4(line: &str, registry: Registry) -> Ipv4Range {
        match DelegationRecord::parse(line, registry)
            .unwrap()
            .canonicalize()
            .unwrap()
        {
            CanonicalEntry::V4(range) => range,
            CanonicalEntry::V6(_) => panic!("expected an IPv4 range"),
        }
    }

    #[test]
    fn test_parse_valid_ipv4_line() {
        let record =
            DelegationRecord::parse("arin|US|ipv4|8.8.8.0|256|20140328|allocated", Registry::Arin)
                .unwrap();
        assert_eq!(record.country.as_str(), "US");
        assert_eq!(record.family, AddressFamily::Ipv4);
        assert_eq!(record.start, "8.8.8.0");
        assert_eq!(record.value, "256");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2014, 3, 28));
        assert_eq!(record.status, "allocated");
    }

    #[test]
    fn test_parse_rejects_non_allocation_lines() {
        let lines = [
            "",
            "   ",
            "# delegated-arin-extended",
            "2|arin|20250101|12345|19700101|20250101|-0500", // version header
            "arin|*|ipv4|8.8.8.0|256|summary",
            "arin|US|asn|12345|1|20140328|allocated",
            "arin|USA|ipv4|8.8.8.0|256|20140328|allocated",
            "arin|U|ipv4|8.8.8.0|256|20140328|allocated",
            "arin|US|ipv4|8.8.8.0|256", // truncated field list
        ];
        for line in lines {
            assert!(
                DelegationRecord::parse(line, Registry::Arin).is_none(),
                "line should be rejected: {line:?}"
            );
        }
    }

    #[test]
    fn test_parse_counted_classifies_malformed_lines() {
        let stats = RejectStats::new();
        assert!(DelegationRecord::parse_counted("arin|US|ipv4|8.8.8.0", Registry::Arin, &stats)
            .is_none());
        assert!(DelegationRecord::parse_counted(
            "arin|U1|ipv4|8.8.8.0|256|20140328|allocated",
            Registry::Arin,
            &stats
        )
        .is_none());
        assert_eq!(stats.get_count(RejectReason::TruncatedLine), 1);
        assert_eq!(stats.get_count(RejectReason::BadCountryCode), 1);

        // Comments, summaries and asn rows are dropped without counting.
        for line in [
            "# comment",
            "arin|*|ipv4|*|30784|summary",
            "arin|US|asn|12345|1|20140328|allocated",
        ] {
            assert!(DelegationRecord::parse_counted(line, Registry::Arin, &stats).is_none());
        }
        assert_eq!(stats.total(), 2);
    }

    #[test]
    fn test_parse_uppercases_country_code() {
        let record =
            DelegationRecord::parse("apnic|jp|ipv4|1.0.16.0|4096|20110412|allocated", Registry::Apnic)
                .unwrap();
        assert_eq!(record.country.as_str(), "JP");
    }

    #[test]
    fn test_parse_clears_malformed_date() {
        // An 8-character date that is not a calendar date clears to None.
        let record = DelegationRecord::parse(
            "arin|US|ipv4|8.8.8.0|256|20141399|allocated",
            Registry::Arin,
        )
        .unwrap();
        assert!(record.date.is_none());

        // So does a date of the wrong length.
        let record =
            DelegationRecord::parse("arin|US|ipv4|8.8.8.0|256|2014|allocated", Registry::Arin)
                .unwrap();
        assert!(record.date.is_none());

        // An empty date is simply absent.
        let record =
            DelegationRecord::parse("ripencc|FR|ipv6|2a01:e00::|32||allocated", Registry::RipeNcc)
                .unwrap();
        assert!(record.date.is_none());
    }

    #[test]
    fn test_country_code_rejects_non_letters() {
        assert!(CountryCode::parse("*").is_none());
        assert!(CountryCode::parse("U1").is_none());
        assert!(CountryCode::parse("").is_none());
        assert!(CountryCode::parse("USA").is_none());
        assert_eq!(CountryCode::parse("de").unwrap().as_str(), "DE");
    }

    #[test]
    fn test_canonicalize_ipv4_count_to_interval() {
        let range = canonical_v4("arin|US|ipv4|8.8.8.0|256|20140328|allocated", Registry::Arin);
        assert_eq!(range.start, 134744064); // 8.8.8.0
        assert_eq!(range.end, 134744319); // 8.8.8.255
        assert_eq!(range.meta.country.as_str(), "US");
    }

    #[test]
    fn test_canonicalize_ipv4_single_address() {
        let range = canonical_v4("arin|US|ipv4|1.2.3.4|1|20140328|assigned", Registry::Arin);
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn test_canonicalize_ipv4_overflow_dropped() {
        let record = DelegationRecord::parse(
            "arin|US|ipv4|255.255.255.0|512|20140328|allocated",
            Registry::Arin,
        )
        .unwrap();
        assert_eq!(record.canonicalize().unwrap_err(), RejectReason::Ipv4Overflow);
    }

    #[test]
    fn test_canonicalize_ipv4_count_overflowing_u64_dropped() {
        // A count so large that start + count - 1 overflows even u64 must be
        // rejected like any other out-of-space range, not wrap around to an
        // interval with end < start.
        for count in ["18446744073709551615", "18446744073709551608"] {
            let record = DelegationRecord::parse(
                &format!("arin|US|ipv4|8.8.8.0|{count}||allocated"),
                Registry::Arin,
            )
            .unwrap();
            assert_eq!(
                record.canonicalize().unwrap_err(),
                RejectReason::Ipv4Overflow,
                "count {count} should overflow"
            );
        }
    }

    #[test]
    fn test_canonicalize_ipv4_full_space_fits() {
        let range = canonical_v4("arin|US|ipv4|0.0.0.0|4294967296|20140328|allocated", Registry::Arin);
        assert_eq!(range.start, 0);
        assert_eq!(range.end, u32::MAX);
    }

    #[test]
    fn test_canonicalize_ipv4_bad_fields() {
        let bad_addr =
            DelegationRecord::parse("arin|US|ipv4|not.an.ip|256||allocated", Registry::Arin)
                .unwrap();
        assert_eq!(
            bad_addr.canonicalize().unwrap_err(),
            RejectReason::BadIpv4Address
        );

        let zero_count =
            DelegationRecord::parse("arin|US|ipv4|8.8.8.0|0||allocated", Registry::Arin).unwrap();
        assert_eq!(
            zero_count.canonicalize().unwrap_err(),
            RejectReason::BadIpv4Count
        );

        let non_numeric =
            DelegationRecord::parse("arin|US|ipv4|8.8.8.0|/24||allocated", Registry::Arin).unwrap();
        assert_eq!(
            non_numeric.canonicalize().unwrap_err(),
            RejectReason::BadIpv4Count
        );
    }

    #[test]
    fn test_canonicalize_ipv6_clears_host_bits() {
        let record = DelegationRecord::parse(
            "ripencc|FR|ipv6|2a01:e00::1|32||allocated",
            Registry::RipeNcc,
        )
        .unwrap();
        let range = match record.canonicalize().unwrap() {
            CanonicalEntry::V6(range) => range,
            CanonicalEntry::V4(_) => panic!("expected an IPv6 range"),
        };
        assert_eq!(range.network_addr(), "2a01:e00::".parse::<Ipv6Addr>().unwrap());
        assert_eq!(range.prefix_len, 32);
    }

    #[test]
    fn test_canonicalize_ipv6_bad_fields() {
        let bad_prefix =
            DelegationRecord::parse("ripencc|FR|ipv6|2a01:e00::|129||allocated", Registry::RipeNcc)
                .unwrap();
        assert_eq!(
            bad_prefix.canonicalize().unwrap_err(),
            RejectReason::BadIpv6Prefix
        );

        let bad_addr =
            DelegationRecord::parse("ripencc|FR|ipv6|2a01:zz::|32||allocated", Registry::RipeNcc)
                .unwrap();
        assert_eq!(
            bad_addr.canonicalize().unwrap_err(),
            RejectReason::BadIpv6Address
        );
    }

    #[test]
    fn test_prefix_mask_boundaries() {
        assert_eq!(prefix_mask(0), 0);
        assert_eq!(prefix_mask(128), u128::MAX);
        assert_eq!(prefix_mask(1), 1u128 << 127);
    }
}
