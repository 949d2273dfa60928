//! Cluster membership operations (spec §4.3.3): adding and removing workers
//! from the ring. The router never owns a worker's process lifecycle —
//! these calls only ever mutate ring membership.

use districache_common::{Error, Result, RingStats};

use crate::addr::{bare_addr, is_local_host, node_url};
use crate::context::RouterContext;

/// Registers a worker at `host:port` in the ring.
///
/// If the worker does not answer a health probe and `host` is local, waits
/// up to `spawn_timeout` polling for it to come up (an operator may be
/// starting it out-of-band; actually spawning the process is outside the
/// core's scope — see spec §1). A remote, unreachable host fails fast with
/// [`Error::InvalidArgument`], matching the reference's "cannot auto-start
/// remote nodes" rejection.
pub async fn add_node(ctx: &RouterContext, host: &str, port: u16) -> Result<RingStats> {
    let node = node_url(host, port);
    let addr = bare_addr(&node).to_string();

    if ctx.client.health(&addr).await.is_err() {
        if !is_local_host(host) {
            return Err(Error::InvalidArgument(format!(
                "cannot auto-start remote node {node}: please start it manually"
            )));
        }
        let healthy = ctx
            .client
            .wait_healthy(&addr, ctx.config.spawn_timeout, std::time::Duration::from_millis(200))
            .await;
        if !healthy {
            return Err(Error::ServiceUnavailable(format!(
                "node {node} did not become healthy within {:?}",
                ctx.config.spawn_timeout
            )));
        }
    }

    ctx.ring.add(node);
    Ok(ctx.ring.stats())
}

/// Removes a worker at `host:port` from the ring. Does not touch the
/// worker's process.
pub fn remove_node(ctx: &RouterContext, host: &str, port: u16) -> Result<RingStats> {
    let node = node_url(host, port);
    if !ctx.ring.contains(&node) {
        return Err(Error::NotFound(format!("node {node} not found in cluster")));
    }
    ctx.ring.remove(&node);
    Ok(ctx.ring.stats())
}
