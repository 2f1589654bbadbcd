//! Longest-prefix-match index over IPv6 delegation prefixes.
//!
//! IPv6 delegations are always CIDR blocks, so the index groups ranges by
//! prefix length and keeps each group sorted by network address. A query
//! walks lengths from most to least specific and does a sorted search per
//! group; the first hit is the longest matching prefix.

use crate::record::{prefix_mask, Ipv6Range};

/// Immutable longest-prefix-match index over IPv6 allocation prefixes.
#[derive(Debug, Default)]
pub struct Ipv6Index {
    /// `groups[len]` holds the ranges with that prefix length, sorted by
    /// network ascending; `None` for lengths with no ranges. Equal networks
    /// keep accumulation order, so the last-accumulated entry is the last
    /// of its run.
    groups: Vec<Option<Vec<Ipv6Range>>>,
    /// Populated prefix lengths, longest first, so lookups only visit
    /// lengths that exist.
    lengths: Vec<u8>,
    len: usize,
}

impl Ipv6Index {
    /// Builds the index from accumulated canonical ranges.
    pub fn build(ranges: Vec<Ipv6Range>) -> Ipv6Index {
        let mut groups: Vec<Option<Vec<Ipv6Range>>> = (0..=128).map(|_| None).collect();
        let len = ranges.len();

        for range in ranges {
            groups[range.prefix_len as usize]
                .get_or_insert_with(Vec::new)
                .push(range);
        }
        for group in groups.iter_mut().flatten() {
            // Stable: duplicates of a network stay in accumulation order.
            group.sort_by_key(|r| r.network);
        }

        let lengths = (0..=128u8)
            .rev()
            .filter(|&l| groups[l as usize].is_some())
            .collect();

        Ipv6Index {
            groups,
            lengths,
            len,
        }
    }

    /// Returns the longest-prefix match for `addr`, if any.
    ///
    /// Among duplicate entries for the same network the last-accumulated one
    /// wins, implementing last-write-wins across rebuild input order.
    pub fn lookup(&self, addr: u128) -> Option<&Ipv6Range> {
        for &len in &self.lengths {
            let group = self.groups[len as usize].as_deref()?;
            let key = addr & prefix_mask(len);
            // Rightmost entry with this network, i.e. the latest accumulated.
            let upper = group.partition_point(|r| r.network <= key);
            if upper > 0 && group[upper - 1].network == key {
                return Some(&group[upper - 1]);
            }
        }
        None
    }

    /// All ranges, ordered by prefix length descending then network.
    pub fn ranges(&self) -> impl Iterator<Item = &Ipv6Range> {
        self.lengths
            .iter()
            .filter_map(|&l| self.groups[l as usize].as_deref())
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CountryCode, RangeMeta};
    use crate::registry::Registry;
    use std::net::Ipv6Addr;

    fn range(network: &str, prefix_len: u8, cc: &str) -> Ipv6Range {
        let addr: Ipv6Addr = network.parse().unwrap();
        Ipv6Range {
            network: u128::from(addr) & prefix_mask(prefix_len),
            prefix_len,
            meta: RangeMeta {
                country: CountryCode::parse(cc).unwrap(),
                registry: Registry::RipeNcc,
                date: None,
                status: "allocated".to_string(),
            },
        }
    }

    fn addr(s: &str) -> u128 {
        u128::from(s.parse::<Ipv6Addr>().unwrap())
    }

    #[test]
    fn test_lookup_empty_index() {
        let index = Ipv6Index::build(Vec::new());
        assert!(index.lookup(addr("2001:db8::1")).is_none());
    }

    #[test]
    fn test_basic_prefix_match() {
        let index = Ipv6Index::build(vec![range("2a01:e00::", 32, "FR")]);
        assert_eq!(
            index.lookup(addr("2a01:e00::1")).unwrap().meta.country.as_str(),
            "FR"
        );
        assert!(index.lookup(addr("2a02:e00::1")).is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let index = Ipv6Index::build(vec![
            range("2001:db8::", 32, "DE"),
            range("2001:db8::", 48, "NL"),
        ]);
        // Inside the /48: the more specific prefix wins.
        assert_eq!(
            index.lookup(addr("2001:db8::1")).unwrap().meta.country.as_str(),
            "NL"
        );
        // Inside the /32 but outside the /48: falls back to the broader one.
        assert_eq!(
            index
                .lookup(addr("2001:db8:ffff::1"))
                .unwrap()
                .meta
                .country
                .as_str(),
            "DE"
        );
    }

    #[test]
    fn test_matched_network_reported() {
        let index = Ipv6Index::build(vec![range("2001:db8::", 48, "NL")]);
        let hit = index.lookup(addr("2001:db8::42")).unwrap();
        assert_eq!(hit.network_addr(), "2001:db8::".parse::<Ipv6Addr>().unwrap());
        assert_eq!(hit.prefix_len, 48);
    }

    #[test]
    fn test_duplicate_network_last_accumulated_wins() {
        let index = Ipv6Index::build(vec![
            range("2001:db8::", 32, "DE"),
            range("2001:db8::", 32, "AT"),
        ]);
        assert_eq!(
            index.lookup(addr("2001:db8::1")).unwrap().meta.country.as_str(),
            "AT"
        );
    }

    #[test]
    fn test_zero_length_prefix_matches_everything() {
        let index = Ipv6Index::build(vec![range("::", 0, "US")]);
        assert_eq!(
            index.lookup(addr("ffff::1")).unwrap().meta.country.as_str(),
            "US"
        );
    }

    #[test]
    fn test_host_prefix() {
        let index = Ipv6Index::build(vec![range("2001:db8::7", 128, "JP")]);
        assert_eq!(
            index.lookup(addr("2001:db8::7")).unwrap().meta.country.as_str(),
            "JP"
        );
        assert!(index.lookup(addr("2001:db8::8")).is_none());
    }

    #[test]
    fn test_groups_sorted_within_length() {
        let index = Ipv6Index::build(vec![
            range("2a03::", 32, "SE"),
            range("2a01::", 32, "FR"),
            range("2a02::", 32, "DE"),
        ]);
        assert_eq!(
            index.lookup(addr("2a02::9")).unwrap().meta.country.as_str(),
            "DE"
        );
        assert_eq!(index.len(), 3);
    }
}
