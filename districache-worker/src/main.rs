//! Cache worker entry point (spec §6 CLI: `--host`, `--port`, `--capacity`).

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use districache_worker::{run, WorkerConfig};

/// DistriCache cache worker: a single capacity-bounded LRU+TTL shard.
#[derive(Parser, Debug)]
#[command(name = "districache-worker")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host address to bind to.
    #[arg(long, default_value = "127.0.0.1", env = "DISTRICACHE_WORKER_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8001, env = "DISTRICACHE_WORKER_PORT")]
    port: u16,

    /// Maximum number of entries the cache holds before evicting.
    #[arg(long, default_value_t = 100, env = "DISTRICACHE_WORKER_CAPACITY")]
    capacity: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = WorkerConfig { host: args.host, port: args.port, capacity: args.capacity };

    run(config).await?;
    Ok(())
}
