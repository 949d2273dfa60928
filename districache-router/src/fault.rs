//! The "chaos" membership mutator and the bidirectional partition map (spec
//! §4.4). Neither component touches a worker process or the durable store;
//! both only ever mutate or consult ring membership / the partition edges.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use districache_common::{Error, Result};
use districache_ring::HashRing;

/// Bidirectional network-partition blacklist, keyed by port identifier
/// (spec §3 "PartitionMap", §4.4).
#[derive(Default)]
pub struct PartitionMap {
    edges: Mutex<HashSet<(String, String)>>,
}

fn normalize(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl PartitionMap {
    pub fn new() -> Self {
        PartitionMap::default()
    }

    /// Blocks communication between `a` and `b` in both directions.
    pub fn create(&self, a: &str, b: &str) {
        self.edges.lock().insert(normalize(a, b));
    }

    /// Heals the link between `a` and `b`, if blocked.
    pub fn remove(&self, a: &str, b: &str) {
        self.edges.lock().remove(&normalize(a, b));
    }

    /// `true` iff either direction between `a` and `b` is blocked.
    pub fn blocked(&self, a: &str, b: &str) -> bool {
        self.edges.lock().contains(&normalize(a, b))
    }

    /// Every blocked pair, deduplicated (each unordered pair appears once).
    pub fn list(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self.edges.lock().iter().cloned().collect();
        pairs.sort();
        pairs
    }

    /// Drops every partition edge.
    pub fn clear_all(&self) {
        self.edges.lock().clear();
    }
}

/// Snapshot of the chaos controller's configuration and running state (spec
/// §4.3.4/§4.4, `GET /chaos/status`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaosStatus {
    pub enabled: bool,
    pub is_running: bool,
    pub min_nodes_threshold: usize,
    pub can_start: bool,
}

/// Periodic, bounded random removal of ring members (spec §4.4).
///
/// State machine `{Idle, Running}`; `running` is the single source of
/// truth, checked both by external callers (`status`) and by the spawned
/// task on every wake-up.
pub struct ChaosController {
    min_nodes: usize,
    interval: (u64, u64),
    running: Arc<std::sync::atomic::AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChaosController {
    pub fn new(min_nodes: usize, interval: (u64, u64)) -> Self {
        ChaosController {
            min_nodes,
            interval,
            running: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    pub fn min_nodes(&self) -> usize {
        self.min_nodes
    }

    pub fn is_running(&self) -> bool {
        self.running.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Current status, including whether a start would currently succeed.
    pub fn status(&self, ring: &HashRing) -> ChaosStatus {
        let is_running = self.is_running();
        ChaosStatus {
            enabled: is_running,
            is_running,
            min_nodes_threshold: self.min_nodes,
            can_start: ring.len() > self.min_nodes,
        }
    }

    /// Starts the destruction loop. Fails with [`Error::BadRequest`] unless
    /// the ring currently has more than `min_nodes` members.
    pub fn start(&self, ring: Arc<HashRing>) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        if ring.len() <= self.min_nodes {
            return Err(Error::BadRequest(format!(
                "cannot start chaos: need more than {} nodes in the cluster",
                self.min_nodes
            )));
        }

        self.running.store(true, std::sync::atomic::Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let min_nodes = self.min_nodes;
        let (lo, hi) = self.interval;

        let handle = tokio::spawn(async move {
            info!("chaos controller started");
            while running.load(std::sync::atomic::Ordering::SeqCst) {
                let wait_secs = rand::thread_rng().gen_range(lo..=hi);
                tokio::time::sleep(std::time::Duration::from_secs(wait_secs)).await;

                if !running.load(std::sync::atomic::Ordering::SeqCst) {
                    break;
                }
                if ring.len() <= min_nodes {
                    warn!(remaining = ring.len(), "chaos strike skipped: too few nodes remaining");
                    continue;
                }
                if let Some(victim) = ring.random_node() {
                    ring.remove(&victim);
                    info!(%victim, remaining = ring.len(), "chaos strike: removed node");
                }
            }
            info!("chaos controller stopped");
        });

        *self.task.lock() = Some(handle);
        Ok(())
    }

    /// Stops the destruction loop. The in-flight sleep is aborted
    /// immediately rather than waiting for its natural wake-up.
    pub fn stop(&self) {
        self.running.store(false, std::sync::atomic::Ordering::SeqCst);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}
