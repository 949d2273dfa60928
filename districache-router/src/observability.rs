//! Fan-out observability reads (spec §4.3.4): `GlobalStats` aggregates every
//! worker's cache counters; `AllKeys` aggregates and deduplicates every
//! worker's live entries.

use serde::Serialize;

use districache_proto::{Request, Response};

use crate::addr::{bare_addr, port_of};
use crate::context::RouterContext;

/// One worker's contribution to `GlobalStats` (spec §4.3.4 "per-node
/// `current_size`").
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatsEntry {
    pub node: String,
    pub hits: u64,
    pub misses: u64,
    pub current_size: usize,
    pub capacity: usize,
}

/// A chart-friendly `{name, value}` pair, matching the original
/// prototype's `request_distribution`/`node_load` dashboard shape (spec
/// §9 supplement, SPEC_FULL.md).
#[derive(Debug, Clone, Serialize)]
pub struct NamedValue {
    pub name: String,
    pub value: u64,
}

/// Aggregated cluster-wide cache statistics (spec §4.3.4 `GlobalStats`).
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub total_requests: u64,
    pub nodes: Vec<NodeStatsEntry>,
    pub node_load: Vec<NamedValue>,
    pub request_distribution: Vec<NamedValue>,
}

/// Fans `Stats` out to every ring member. Unreachable nodes contribute
/// zero rather than failing the whole aggregate.
pub async fn global_stats(ctx: &RouterContext) -> GlobalStats {
    let nodes = ctx.ring.stats().nodes;
    let mut entries = Vec::with_capacity(nodes.len());
    let mut total_hits = 0u64;
    let mut total_misses = 0u64;
    let mut node_load = Vec::with_capacity(nodes.len());

    for node in &nodes {
        let stats = match ctx.client.call(bare_addr(node), Request::Stats).await {
            Ok(Response::Stats(stats)) => stats,
            _ => districache_common::CacheStats { hits: 0, misses: 0, hit_rate: 0.0, current_size: 0, capacity: 0 },
        };
        total_hits += stats.hits;
        total_misses += stats.misses;
        let port = port_of(node);
        node_load.push(NamedValue { name: port.clone(), value: stats.current_size as u64 });
        entries.push(NodeStatsEntry {
            node: node.clone(),
            hits: stats.hits,
            misses: stats.misses,
            current_size: stats.current_size,
            capacity: stats.capacity,
        });
    }

    node_load.sort_by_key(|nv| nv.name.parse::<u64>().unwrap_or(u64::MAX));

    let total_requests = total_hits + total_misses;
    let hit_rate = districache_common::CacheStats::hit_rate(total_hits, total_misses);

    GlobalStats {
        hits: total_hits,
        misses: total_misses,
        hit_rate,
        total_requests,
        nodes: entries,
        node_load,
        request_distribution: vec![
            NamedValue { name: "Hits".into(), value: total_hits },
            NamedValue { name: "Misses".into(), value: total_misses },
        ],
    }
}

/// One deduplicated key across the cluster (spec §4.3.4 `AllKeys`).
#[derive(Debug, Clone, Serialize)]
pub struct KeyEntry {
    pub key: String,
    pub value: String,
    pub ttl_remaining: Option<f64>,
    pub node: String,
}

/// Result of fanning `ListWithTTL` out to every worker, deduplicated by key
/// (first occurrence wins) and sorted by remaining TTL ascending, no-TTL
/// entries last.
#[derive(Debug, Clone, Serialize)]
pub struct AllKeysResponse {
    pub keys: Vec<KeyEntry>,
    pub total_keys: usize,
    pub nodes_queried: usize,
}

pub async fn all_keys(ctx: &RouterContext) -> AllKeysResponse {
    let nodes = ctx.ring.stats().nodes;
    let mut seen = std::collections::HashSet::new();
    let mut keys = Vec::new();
    let mut nodes_queried = 0;

    for node in &nodes {
        let entries = match ctx.client.call(bare_addr(node), Request::ListWithTtl).await {
            Ok(Response::Keys(entries)) => entries,
            _ => continue,
        };
        nodes_queried += 1;
        let port = port_of(node);
        for entry in entries {
            if seen.insert(entry.key.clone()) {
                keys.push(KeyEntry {
                    key: entry.key,
                    value: entry.value,
                    ttl_remaining: entry.ttl_remaining,
                    node: port.clone(),
                });
            }
        }
    }

    keys.sort_by(|a, b| match (a.ttl_remaining, b.ttl_remaining) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let total_keys = keys.len();
    AllKeysResponse { keys, total_keys, nodes_queried }
}

/// Per-worker raw stats plus ring geometry (spec §6 `GET /cluster/stats`).
/// A node that fails to answer contributes an error string instead of
/// aborting the whole response.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterStatsResponse {
    pub ring_stats: districache_common::RingStats,
    pub node_stats: std::collections::HashMap<String, serde_json::Value>,
}

pub async fn cluster_stats(ctx: &RouterContext) -> ClusterStatsResponse {
    let ring_stats = ctx.ring.stats();
    let mut node_stats = std::collections::HashMap::with_capacity(ring_stats.nodes.len());

    for node in &ring_stats.nodes {
        let value = match ctx.client.call(bare_addr(node), Request::Stats).await {
            Ok(Response::Stats(stats)) => serde_json::to_value(stats).unwrap_or(serde_json::Value::Null),
            Ok(other) => serde_json::json!({ "error": format!("unexpected reply: {other:?}") }),
            Err(err) => serde_json::json!({ "error": err.to_string() }),
        };
        node_stats.insert(node.clone(), value);
    }

    ClusterStatsResponse { ring_stats, node_stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use crate::context::RouterContext;
    use districache_store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn global_stats_on_empty_ring_is_zero() {
        let ctx = RouterContext::new(Arc::new(MemoryStore::new()), RouterConfig::default());
        let stats = global_stats(&ctx).await;
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert!(stats.nodes.is_empty());
    }

    #[tokio::test]
    async fn all_keys_on_empty_ring_is_empty() {
        let ctx = RouterContext::new(Arc::new(MemoryStore::new()), RouterConfig::default());
        let resp = all_keys(&ctx).await;
        assert_eq!(resp.total_keys, 0);
        assert_eq!(resp.nodes_queried, 0);
    }
}
