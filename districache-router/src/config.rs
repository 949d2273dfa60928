//! Router configuration: the tunable constants of spec §6 collected into one
//! struct, overridable by CLI flags (`districache-worker`'s sibling in
//! `main.rs`), following a `clap`-derived `Args` struct with per-field
//! `env` fallbacks.

use std::time::Duration;

use districache_common::{
    BYPASS_SIMULATED_LATENCY, CACHE_REFILL_TTL, CHAOS_INTERVAL, CHAOS_MIN_NODES, DEFAULT_REPLICATION_FACTOR,
    DEFAULT_VIRTUAL_NODES_PER_PHYSICAL, ROUTER_PARTITION_PORT, SPAWN_TIMEOUT,
};

/// Tunables the router's data and control paths read from. Defaults match
/// spec §6 verbatim; CLI/env overrides are limited to `host`, `port`, and
/// `db_path` (the rest are architectural constants, not deployment knobs).
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub host: String,
    pub port: u16,
    pub db_path: Option<String>,

    pub virtual_nodes_per_physical: usize,
    pub replication_factor: usize,
    pub cache_refill_ttl: Duration,
    pub bypass_simulated_latency: Duration,
    pub spawn_timeout: Duration,
    pub chaos_min_nodes: usize,
    pub chaos_interval: (u64, u64),
    /// Fixed identity the router uses on its side of `PartitionMap::blocked`
    /// checks (spec §9 resolved ambiguity).
    pub router_partition_port: &'static str,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            host: "0.0.0.0".into(),
            port: 8000,
            db_path: None,
            virtual_nodes_per_physical: DEFAULT_VIRTUAL_NODES_PER_PHYSICAL,
            replication_factor: DEFAULT_REPLICATION_FACTOR,
            cache_refill_ttl: CACHE_REFILL_TTL,
            bypass_simulated_latency: BYPASS_SIMULATED_LATENCY,
            spawn_timeout: SPAWN_TIMEOUT,
            chaos_min_nodes: CHAOS_MIN_NODES,
            chaos_interval: CHAOS_INTERVAL,
            router_partition_port: ROUTER_PARTITION_PORT,
        }
    }
}
