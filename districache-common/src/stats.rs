//! Data shapes that cross the worker/router boundary, and ultimately the
//! router's HTTP boundary. Kept `serde`-derivable here so the HTTP layer can
//! reuse them verbatim instead of re-declaring DTOs.

use serde::{Deserialize, Serialize};

/// Cache statistics for a single worker (spec §4.1 `Stats`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub current_size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Computes `hit_rate` per spec: percentage, two decimal places, 0 when
    /// no requests have been observed.
    pub fn hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            return 0.0;
        }
        let rate = (hits as f64 / total as f64) * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

/// One live entry as returned by `ListWithTTL` (spec §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyWithTtl {
    pub key: String,
    pub value: String,
    /// `None` for no-TTL entries; otherwise seconds remaining, rounded to
    /// one decimal place.
    pub ttl_remaining: Option<f64>,
}

/// Hash ring statistics (spec §4.2 `Stats`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingStats {
    pub num_physical_nodes: usize,
    pub num_virtual_nodes: usize,
    pub nodes: Vec<String>,
    pub virtual_nodes_per_physical: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_with_no_requests() {
        assert_eq!(CacheStats::hit_rate(0, 0), 0.0);
    }

    #[test]
    fn hit_rate_rounds_to_two_decimals() {
        // 1/3 hits -> 33.333...%, rounded to 33.33
        assert_eq!(CacheStats::hit_rate(1, 2), 33.33);
    }

    #[test]
    fn hit_rate_all_hits() {
        assert_eq!(CacheStats::hit_rate(5, 0), 100.0);
    }

    #[test]
    fn node_metadata_sorts_by_angle() {
        let mut nodes = vec![
            NodeMetadata { id: "b".into(), angle: 200 },
            NodeMetadata { id: "a".into(), angle: 10 },
        ];
        nodes.sort();
        assert_eq!(nodes[0].id, "a");
        assert_eq!(nodes[1].id, "b");
    }
}

/// One node's position on the ring dial (spec §4.2 `NodesMetadata`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeMetadata {
    pub id: String,
    pub angle: u64,
}

impl PartialOrd for NodeMetadata {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeMetadata {
    /// Sorted by ring position, matching spec §4.2's "sorted sequence ...
    /// for every occupied position."
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.angle.cmp(&other.angle).then_with(|| self.id.cmp(&other.id))
    }
}
