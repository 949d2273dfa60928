//! Worker configuration (spec §6 CLI, worker section).

use districache_common::DEFAULT_WORKER_CAPACITY;

/// Startup configuration for a cache worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub host: String,
    pub port: u16,
    pub capacity: usize,
}

impl WorkerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig { host: "127.0.0.1".into(), port: 8001, capacity: DEFAULT_WORKER_CAPACITY }
    }
}
