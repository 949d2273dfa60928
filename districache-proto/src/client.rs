//! # Pooled Async Worker Client
//!
//! The router's view of a cache worker: a connection pool per worker
//! address, built on `tokio::net::TcpStream` so many pending RPCs share one
//! task instead of one thread each.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: idle connections are kept bounded per address
//!    and reused across calls.
//! 2. **Fail Fast, Don't Poison**: a connection that errors mid-RPC is
//!    dropped instead of returned to the pool.
//! 3. **One Pool per Address**: workers come and go with ring membership, so
//!    pools are created lazily and never proactively torn down — an idle
//!    pool for a removed worker costs nothing but a few bytes.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::time::timeout;

use districache_common::{Error, Result, WORKER_RPC_TIMEOUT};

use crate::message::{decode_response, encode_request, Request, Response};
use crate::resp::{encode_value, read_value, write_frame};

struct Connection {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
    line_buf: Vec<u8>,
}

impl Connection {
    async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(|e| Error::Transport(e.to_string()))?;
        stream.set_nodelay(true).ok();
        let (read_half, write_half) = stream.into_split();
        Ok(Connection {
            reader: BufReader::new(read_half),
            writer: write_half,
            line_buf: Vec::with_capacity(128),
        })
    }

    async fn exec(&mut self, req: &Request) -> Result<Response> {
        let mut out = Vec::with_capacity(64);
        encode_value(&encode_request(req), &mut out);
        write_frame(&mut self.writer, &out).await?;
        let value = read_value(&mut self.reader, &mut self.line_buf).await?;
        decode_response(value, req)
    }
}

struct PoolState {
    idle: VecDeque<Connection>,
    total: usize,
}

struct Pool {
    addr: String,
    max_idle: usize,
    max_total: usize,
    state: Mutex<PoolState>,
}

impl Pool {
    fn new(addr: String, max_idle: usize, max_total: usize) -> Self {
        Pool { addr, max_idle, max_total, state: Mutex::new(PoolState { idle: VecDeque::new(), total: 0 }) }
    }

    fn take_idle(&self) -> Option<Connection> {
        self.state.lock().idle.pop_front()
    }

    fn try_reserve(&self) -> bool {
        let mut state = self.state.lock();
        if state.total >= self.max_total {
            return false;
        }
        state.total += 1;
        true
    }

    fn release_slot(&self) {
        let mut state = self.state.lock();
        state.total = state.total.saturating_sub(1);
    }

    fn give_back(&self, conn: Connection) {
        let mut state = self.state.lock();
        if state.idle.len() < self.max_idle {
            state.idle.push_back(conn);
        } else {
            state.total = state.total.saturating_sub(1);
        }
    }

    async fn acquire(&self) -> Result<Connection> {
        if let Some(conn) = self.take_idle() {
            return Ok(conn);
        }
        if !self.try_reserve() {
            return Err(Error::ServiceUnavailable(format!("connection pool exhausted for {}", self.addr)));
        }
        match Connection::connect(&self.addr).await {
            Ok(conn) => Ok(conn),
            Err(err) => {
                self.release_slot();
                Err(err)
            }
        }
    }

    async fn call(&self, req: &Request) -> Result<Response> {
        let mut conn = self.acquire().await?;
        match timeout(WORKER_RPC_TIMEOUT, conn.exec(req)).await {
            Ok(Ok(resp)) => {
                self.give_back(conn);
                Ok(resp)
            }
            Ok(Err(err)) => {
                self.release_slot();
                Err(err)
            }
            Err(_) => {
                self.release_slot();
                Err(Error::Transport(format!("RPC to {} timed out", self.addr)))
            }
        }
    }
}

/// Per-worker-address connection pooling, configurable up front and shared
/// across every `WorkerClient::call` from the router.
#[derive(Debug, Clone, Copy)]
pub struct WorkerClientConfig {
    pub max_idle_per_worker: usize,
    pub max_total_per_worker: usize,
}

impl Default for WorkerClientConfig {
    fn default() -> Self {
        WorkerClientConfig { max_idle_per_worker: 8, max_total_per_worker: 32 }
    }
}

/// The router's handle to every worker it currently talks to.
pub struct WorkerClient {
    config: WorkerClientConfig,
    pools: Mutex<HashMap<String, Arc<Pool>>>,
}

impl WorkerClient {
    pub fn new(config: WorkerClientConfig) -> Self {
        WorkerClient { config, pools: Mutex::new(HashMap::new()) }
    }

    fn pool_for(&self, addr: &str) -> Arc<Pool> {
        let mut pools = self.pools.lock();
        pools
            .entry(addr.to_string())
            .or_insert_with(|| {
                Arc::new(Pool::new(addr.to_string(), self.config.max_idle_per_worker, self.config.max_total_per_worker))
            })
            .clone()
    }

    /// Issues `Health` against `addr`. Used by `AddNode`'s reachability probe.
    pub async fn health(&self, addr: &str) -> Result<()> {
        self.health_info(addr).await.map(|_| ())
    }

    /// Issues `Health` against `addr` and returns `(current_size, capacity)`.
    pub async fn health_info(&self, addr: &str) -> Result<(usize, usize)> {
        match self.call(addr, Request::Health).await? {
            Response::Health { current_size, capacity } => Ok((current_size, capacity)),
            other => Err(Error::Transport(format!("unexpected health reply: {other:?}"))),
        }
    }

    /// Issues `req` against the worker at `addr`.
    pub async fn call(&self, addr: &str, req: Request) -> Result<Response> {
        let pool = self.pool_for(addr);
        pool.call(&req).await
    }

    /// Convenience wrapper for a probe with an explicit timeout, used when
    /// waiting for a freshly spawned worker to come up.
    pub async fn wait_healthy(&self, addr: &str, deadline: Duration, poll_interval: Duration) -> bool {
        let started = tokio::time::Instant::now();
        loop {
            if self.health(addr).await.is_ok() {
                return true;
            }
            if started.elapsed() >= deadline {
                return false;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

impl Default for WorkerClient {
    fn default() -> Self {
        WorkerClient::new(WorkerClientConfig::default())
    }
}
