//! Tunable constants (spec §6), collected here so every crate reads the same
//! defaults instead of re-deriving them.

use std::time::Duration;

/// Virtual ring positions created per physical node by default.
pub const DEFAULT_VIRTUAL_NODES_PER_PHYSICAL: usize = 10;

/// Number of replicas (including the primary) targeted by a write.
pub const DEFAULT_REPLICATION_FACTOR: usize = 2;

/// TTL applied when the read path repopulates the cache after a store fetch.
pub const CACHE_REFILL_TTL: Duration = Duration::from_secs(30);

/// Simulated latency for `bypass_cache=true` reads.
pub const BYPASS_SIMULATED_LATENCY: Duration = Duration::from_millis(300);

/// Interval between worker sweeper passes.
pub const SWEEPER_INTERVAL: Duration = Duration::from_secs(5);

/// Client-side timeout applied to every worker RPC.
pub const WORKER_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Chaos controller: minimum nodes to keep alive.
pub const CHAOS_MIN_NODES: usize = 3;

/// Chaos controller: inclusive bounds (seconds) on the strike interval.
pub const CHAOS_INTERVAL: (u64, u64) = (5, 8);

/// How long `AddNode` waits for a freshly spawned local worker to report healthy.
pub const SPAWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Ring key-space modulus. Deliberately coarse (360, not 2^32): the ring is
/// meant to be rendered as a dial, and frequent virtual-node collisions at
/// this resolution are expected, not a bug. Keep this named so a future
/// implementer changes it on purpose.
pub const RING_MODULUS: u64 = 360;

/// Identity used for the router's own side of `PartitionMap::blocked`
/// checks. The reference implementation hardcodes the router to port 8000
/// regardless of where it actually binds; we keep that as a named constant
/// rather than inferring it from the bind address, matching spec §9's
/// resolution of the ambiguity.
pub const ROUTER_PARTITION_PORT: &str = "8000";

/// Default worker cache capacity (entry count) when not overridden by CLI.
pub const DEFAULT_WORKER_CAPACITY: usize = 100;
