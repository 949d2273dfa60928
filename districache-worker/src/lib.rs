//! # districache-worker
//!
//! The cache worker: one [`LruCache`](districache_cache::LruCache) served
//! over `districache-proto`'s binary RPC, plus the background sweeper that
//! evicts expired entries (spec §4.1, §2 "Cache Worker").
//!
//! A worker owns nothing else — no ring, no store, no fault substrate. It is
//! a dumb, capacity-bounded shard that the router routes keys to.

pub mod config;
pub mod server;

pub use config::WorkerConfig;
pub use server::{dispatch, run, serve};
