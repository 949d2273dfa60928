//! Router entry point (spec §6 CLI: `--host`, `--port`, `--db <path>`).

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use districache_router::{http, RouterConfig, RouterContext};
use districache_store::{MemoryStore, SqliteStore, Store};

/// DistriCache router: consistent-hash placement, cache-aside reads,
/// write-through replication, and the chaos/partition fault substrate.
#[derive(Parser, Debug)]
#[command(name = "districache-router")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host address to bind to.
    #[arg(long, default_value = "0.0.0.0", env = "DISTRICACHE_ROUTER_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8000, env = "DISTRICACHE_ROUTER_PORT")]
    port: u16,

    /// Path to the SQLite database backing the durable store. When absent,
    /// an in-memory store is used instead (lost on restart).
    #[arg(long, env = "DISTRICACHE_DB_PATH")]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let store: Arc<dyn Store> = match &args.db {
        Some(path) => {
            tracing::info!(%path, "opening sqlite store");
            Arc::new(SqliteStore::connect(path).await?)
        }
        None => {
            tracing::warn!("no --db given, using an in-memory store (not durable across restarts)");
            Arc::new(MemoryStore::new())
        }
    };

    let config = RouterConfig { host: args.host.clone(), port: args.port, db_path: args.db.clone(), ..RouterConfig::default() };
    let ctx = Arc::new(RouterContext::new(store, config));

    let app = http::build(Arc::clone(&ctx));
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "router listening");

    axum::serve(listener, app).await?;
    Ok(())
}
