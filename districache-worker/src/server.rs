//! TCP accept loop and request dispatch, the worker-side counterpart to
//! `districache_proto::client::WorkerClient` on the router.
//!
//! One connection, one loop: read a RESP value, dispatch, write a RESP
//! value, repeat — but over `tokio::net::TcpStream` so one worker process
//! holds many connections concurrently instead of one thread per client.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use districache_cache::{LruCache, SweeperHandle};
use districache_common::{Error, Result, SWEEPER_INTERVAL};
use districache_proto::{decode_request, encode_response, encode_value, read_value, write_frame, Request, Response};

use crate::config::WorkerConfig;

/// Applies one decoded [`Request`] to `cache` and returns the reply.
///
/// Pure and synchronous: worker-local cache operations never fail (spec
/// §4.1 "Failure semantics"), so every arm returns a concrete `Response`
/// rather than propagating an `Error`.
pub fn dispatch(cache: &LruCache, req: Request) -> Response {
    match req {
        Request::Health => {
            let stats = cache.stats();
            Response::Health { current_size: stats.current_size, capacity: stats.capacity }
        }
        Request::Get { key } => Response::Value(cache.get(&key).map(|v| v.to_string())),
        Request::Put { key, value, ttl_secs } => {
            cache.put(&key, &value, ttl_secs.map(Duration::from_secs));
            Response::Ok
        }
        Request::Delete { key } => Response::Deleted(cache.delete(&key)),
        Request::Stats => Response::Stats(cache.stats()),
        Request::Clear => {
            cache.clear();
            Response::Ok
        }
        Request::ListWithTtl => Response::Keys(cache.list_with_ttl()),
        Request::CleanupExpired => Response::Count(cache.cleanup_expired()),
    }
}

/// Binds `config.bind_addr()`, spawns the sweeper, and serves connections
/// until the process is killed. Each connection is handled on its own task.
pub async fn run(config: WorkerConfig) -> Result<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await.map_err(|e| Error::Internal(e.to_string()))?;
    info!(%addr, capacity = config.capacity, "cache worker listening");
    serve(listener, config.capacity).await
}

/// Serves worker RPCs on an already-bound `listener`. Split out from
/// [`run`] so tests (and anything embedding a worker) can bind to an
/// OS-assigned port and learn the real address before serving.
pub async fn serve(listener: TcpListener, capacity: usize) -> Result<()> {
    let cache = Arc::new(LruCache::new(capacity)?);
    let _sweeper = SweeperHandle::spawn(Arc::clone(&cache), SWEEPER_INTERVAL);

    loop {
        let (stream, peer) = listener.accept().await.map_err(|e| Error::Internal(e.to_string()))?;
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            debug!(%peer, "accepted connection");
            if let Err(err) = handle_connection(stream, cache).await {
                debug!(%peer, %err, "connection closed");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, cache: Arc<LruCache>) -> Result<()> {
    stream.set_nodelay(true).ok();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line_buf = Vec::with_capacity(128);

    loop {
        let value = match read_value(&mut reader, &mut line_buf).await {
            Ok(value) => value,
            Err(_) => return Ok(()), // peer closed the connection
        };

        let response = match decode_request(value) {
            Ok(req) => dispatch(&cache, req),
            Err(err) => {
                warn!(%err, "malformed worker request");
                Response::Error(err.to_string())
            }
        };

        let mut out = Vec::with_capacity(64);
        encode_value(&encode_response(&response), &mut out);
        write_frame(&mut write_half, &out).await?;
    }
}
