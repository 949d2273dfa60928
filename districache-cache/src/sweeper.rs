//! Background TTL sweeper: an async, `tokio`-task counterpart to a
//! thread-based expiration handle, periodically purging expired entries
//! without blocking the request path.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::LruCache;

/// Handle to a spawned sweeper task. Dropping it aborts the task; call
/// [`SweeperHandle::stop`] to await a clean shutdown instead.
pub struct SweeperHandle {
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Spawns a task that calls [`LruCache::cleanup_expired`] every
    /// `interval`, logging how many entries each pass removed.
    pub fn spawn(cache: Arc<LruCache>, interval: Duration) -> Self {
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so the sweeper's
            // first real pass happens after one full interval.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.cleanup_expired();
                if removed > 0 {
                    debug!(removed, "swept expired cache entries");
                }
            }
        });
        SweeperHandle { join }
    }

    /// Aborts the sweeper task and waits for it to unwind.
    pub async fn stop(self) {
        self.join.abort();
        let _ = self.join.await;
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}
