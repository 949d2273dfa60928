//! Bundles the router's global state into one value created at startup and
//! passed explicitly (spec §9 "Global mutable state" — no process-global
//! singletons, unlike the reference implementation).

use std::sync::Arc;

use districache_proto::WorkerClient;
use districache_ring::HashRing;
use districache_store::Store;

use crate::config::RouterConfig;
use crate::fault::{ChaosController, PartitionMap};

/// Everything the router's data, cluster, observability, and fault-control
/// paths need. One instance lives for the process lifetime and is shared
/// behind an `Arc` with every axum handler.
pub struct RouterContext {
    pub ring: Arc<HashRing>,
    pub store: Arc<dyn Store>,
    pub client: Arc<WorkerClient>,
    pub partitions: Arc<PartitionMap>,
    pub chaos: Arc<ChaosController>,
    pub config: RouterConfig,
}

impl RouterContext {
    pub fn new(store: Arc<dyn Store>, config: RouterConfig) -> Self {
        let ring = Arc::new(HashRing::new(config.virtual_nodes_per_physical));
        let chaos = Arc::new(ChaosController::new(config.chaos_min_nodes, config.chaos_interval));
        RouterContext {
            ring,
            store,
            client: Arc::new(WorkerClient::default()),
            partitions: Arc::new(PartitionMap::new()),
            chaos,
            config,
        }
    }
}
