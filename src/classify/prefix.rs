//! Internal network prefix set.
//!
//! Parses the configured CIDR list into an immutable set and answers
//! membership queries on the hot path. Containment is resolved against
//! sorted, merged address ranges with a binary search, so lookups stay
//! O(log n) regardless of how many prefixes are configured.

use std::collections::BTreeSet;
use std::net::IpAddr;

use ipnet::IpNet;

/// An immutable set of network prefixes, built once at startup.
///
/// Prefixes are stored in canonical masked form: `10.1.2.3/8` and
/// `10.0.0.0/8` denote the same network and deduplicate to one entry.
#[derive(Debug, Clone)]
pub struct PrefixSet {
    prefixes: Vec<IpNet>,
    v4: Vec<(u32, u32)>,
    v6: Vec<(u128, u128)>,
}

impl PrefixSet {
    /// Build a prefix set from a configuration string.
    ///
    /// Tokens may be separated by commas, semicolons, spaces, tabs, or
    /// newlines. Tokens that fail to parse as CIDR literals are skipped
    /// with a warning; misconfiguration must never take the process down.
    /// Returns `None` when no valid token remains, in which case every
    /// membership test is false.
    pub fn build(text: &str) -> Option<Self> {
        let mut canonical = BTreeSet::new();
        for token in text.split([',', ';', ' ', '\t', '\n', '\r']) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match token.parse::<IpNet>() {
                Ok(net) => {
                    canonical.insert(net.trunc());
                }
                Err(_) => {
                    tracing::warn!(token, "Skipping malformed CIDR entry in internal ranges");
                }
            }
        }

        if canonical.is_empty() {
            return None;
        }

        let mut v4 = Vec::new();
        let mut v6 = Vec::new();
        for net in &canonical {
            match net {
                IpNet::V4(n) => v4.push((u32::from(n.network()), u32::from(n.broadcast()))),
                IpNet::V6(n) => v6.push((u128::from(n.network()), u128::from(n.broadcast()))),
            }
        }

        Some(Self {
            prefixes: canonical.into_iter().collect(),
            v4: merge_ranges(v4),
            v6: merge_ranges(v6),
        })
    }

    /// True iff at least one prefix in the set covers `addr`.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(a) => range_contains(&self.v4, u32::from(a)),
            IpAddr::V6(a) => range_contains(&self.v6, u128::from(a)),
        }
    }

    /// Number of distinct canonical prefixes in the set.
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// The canonical prefixes, sorted.
    pub fn prefixes(&self) -> &[IpNet] {
        &self.prefixes
    }
}

/// Merge sorted inclusive ranges so overlapping prefixes collapse into one.
fn merge_ranges<T: Ord + Copy>(mut ranges: Vec<(T, T)>) -> Vec<(T, T)> {
    ranges.sort_unstable();
    let mut merged: Vec<(T, T)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 => {
                if end > last.1 {
                    last.1 = end;
                }
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn range_contains<T: Ord + Copy>(ranges: &[(T, T)], value: T) -> bool {
    let idx = ranges.partition_point(|&(start, _)| start <= value);
    idx > 0 && value <= ranges[idx - 1].1
}
