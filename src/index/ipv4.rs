//! Sorted interval index over the 32-bit IPv4 address space.
//!
//! Construction sorts ranges by start (ties: narrower range first) and keeps
//! every source allocation, overlaps included, so exports can reproduce the
//! input faithfully. Lookup resolves overlaps instead: among all ranges
//! containing an address, the narrowest wins, so specific allocations take
//! precedence over broader historical ones.

use crate::record::Ipv4Range;

/// Immutable point-lookup index over IPv4 allocation ranges.
#[derive(Debug, Default)]
pub struct Ipv4Index {
    /// Sorted by (start, end) ascending.
    ranges: Vec<Ipv4Range>,
    /// `running_max_end[i]` = max end of `ranges[0..=i]`. Bounds the
    /// backward probe during lookup: once the running max falls below the
    /// query address, no earlier range can contain it.
    running_max_end: Vec<u32>,
}

impl Ipv4Index {
    /// Builds the index from accumulated canonical ranges.
    pub fn build(mut ranges: Vec<Ipv4Range>) -> Ipv4Index {
        ranges.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

        let mut running_max_end = Vec::with_capacity(ranges.len());
        let mut max_end = 0u32;
        for range in &ranges {
            max_end = max_end.max(range.end);
            running_max_end.push(max_end);
        }

        Ipv4Index {
            ranges,
            running_max_end,
        }
    }

    /// Returns the narrowest range containing `addr`, if any.
    ///
    /// Binary search finds the rightmost range starting at or before `addr`;
    /// a backward probe bounded by the running-max-end array collects the
    /// overlap candidates. O(log n + k) with k the overlap depth at `addr`.
    pub fn lookup(&self, addr: u32) -> Option<&Ipv4Range> {
        let upper = self.ranges.partition_point(|r| r.start <= addr);

        let mut best: Option<&Ipv4Range> = None;
        for i in (0..upper).rev() {
            if self.running_max_end[i] < addr {
                break;
            }
            let candidate = &self.ranges[i];
            if candidate.contains(addr) {
                match best {
                    Some(current) if current.width() <= candidate.width() => {}
                    _ => best = Some(candidate),
                }
            }
        }
        best
    }

    /// Ranges in index order (ascending by start).
    pub fn ranges(&self) -> &[Ipv4Range] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
