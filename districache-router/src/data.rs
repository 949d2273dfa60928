//! Cache-aside reads and write-through + partition-aware replicated writes
//! (spec §4.3.1, §4.3.2) — the two hot paths every other router module
//! exists to support.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::warn;

use districache_common::{Error, ReplicationFailure, Result};
use districache_proto::{Request, Response};

use crate::addr::{bare_addr, port_of};
use crate::context::RouterContext;

/// Where a successful read's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Database,
}

/// Result of [`read`] (spec §6 `DataResponse`).
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse {
    pub key: String,
    pub value: String,
    pub source: Source,
    pub latency_ms: f64,
}

/// One replica the write path could not reach (spec §4.3.2 step 4).
#[derive(Debug, Clone, Serialize)]
pub struct FailedReplication {
    pub node: String,
    pub port: String,
    pub reason: String,
}

/// Result of [`write`] (spec §6 `WriteResponse`).
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub successful_nodes: Vec<String>,
    pub failed_replications: Vec<FailedReplication>,
    pub replicated_count: usize,
}

/// Cache-aside read (spec §4.3.1).
///
/// `bypass` forces the simulated-slow "as if there were no cache" path;
/// every other case resolves the key's primary, tries the cache, and falls
/// back to the durable store on a miss or transport error.
pub async fn read(ctx: &RouterContext, key: &str, bypass: bool) -> Result<DataResponse> {
    let started = Instant::now();

    if bypass {
        tokio::time::sleep(ctx.config.bypass_simulated_latency).await;
        let value = ctx.store.fetch(key).await?.ok_or_else(|| Error::NotFound(key.to_string()))?;
        return Ok(DataResponse { key: key.to_string(), value, source: Source::Database, latency_ms: elapsed_ms(started) });
    }

    let primary = ctx.ring.primary(key).ok_or_else(|| Error::ServiceUnavailable("ring has no members".into()))?;

    let cache_hit = match ctx.client.call(bare_addr(&primary), Request::Get { key: key.to_string() }).await {
        Ok(Response::Value(Some(value))) => Some(value),
        Ok(Response::Value(None)) | Err(_) => None,
        Ok(other) => {
            warn!(?other, "unexpected reply to Get, treating as cache miss");
            None
        }
    };

    if let Some(value) = cache_hit {
        return Ok(DataResponse { key: key.to_string(), value, source: Source::Cache, latency_ms: elapsed_ms(started) });
    }

    let value = ctx.store.fetch(key).await?.ok_or_else(|| Error::NotFound(key.to_string()))?;

    // Best-effort repopulate: initiated before we respond, but its outcome
    // never gates the response (spec §4.3.1 step 6).
    let client = ctx.client.clone();
    let refill_addr = primary.clone();
    let refill_key = key.to_string();
    let refill_value = value.clone();
    let ttl_secs = ctx.config.cache_refill_ttl.as_secs();
    tokio::spawn(async move {
        let req = Request::Put { key: refill_key, value: refill_value, ttl_secs: Some(ttl_secs) };
        let _ = client.call(bare_addr(&refill_addr), req).await;
    });

    Ok(DataResponse { key: key.to_string(), value, source: Source::Database, latency_ms: elapsed_ms(started) })
}

fn elapsed_ms(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

/// Write-through + partition-aware replication (spec §4.3.2).
pub async fn write(ctx: &RouterContext, key: &str, value: &str, ttl: Option<Duration>) -> Result<WriteOutcome> {
    ctx.store.save(key, value).await?;

    let targets = ctx.ring.replicas(key, ctx.config.replication_factor);
    if targets.is_empty() {
        return Err(Error::ServiceUnavailable("ring has no members".into()));
    }

    let partition_between_replicas =
        targets.len() >= 2 && ctx.partitions.blocked(&port_of(&targets[0]), &port_of(&targets[1]));

    let mut successful_nodes = Vec::new();
    let mut failed_replications = Vec::new();
    let ttl_secs = ttl.map(|d| d.as_secs());

    for (idx, target) in targets.iter().enumerate() {
        let target_port = port_of(target);

        if partition_between_replicas && idx == 1 {
            failed_replications.push(FailedReplication {
                node: target.clone(),
                port: target_port,
                reason: ReplicationFailure::Partitioned.to_string(),
            });
            continue;
        }

        if ctx.partitions.blocked(ctx.config.router_partition_port, &target_port) {
            failed_replications.push(FailedReplication {
                node: target.clone(),
                port: target_port,
                reason: ReplicationFailure::Partitioned.to_string(),
            });
            continue;
        }

        let req = Request::Put { key: key.to_string(), value: value.to_string(), ttl_secs };
        match ctx.client.call(bare_addr(target), req).await {
            Ok(_) => successful_nodes.push(target.clone()),
            Err(err) => failed_replications.push(FailedReplication {
                node: target.clone(),
                port: target_port,
                reason: ReplicationFailure::Transport(err.to_string()).to_string(),
            }),
        }
    }

    let replicated_count = successful_nodes.len();
    Ok(WriteOutcome { successful_nodes, failed_replications, replicated_count })
}
