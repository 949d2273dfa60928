//! # districache-router
//!
//! The router/coordinator (spec §4.3): owns the consistent-hash ring, the
//! durable store handle, the pooled worker client, the partition map, and
//! the chaos controller, bundled into one [`RouterContext`] created at
//! startup rather than the reference implementation's process globals
//! (spec §9).
//!
//! - [`data`] — cache-aside reads, write-through + replicated writes.
//! - [`cluster`] — ring membership (`AddNode`/`RemoveNode`).
//! - [`observability`] — fan-out `GlobalStats`/`AllKeys`.
//! - [`fault`] — the partition map and chaos controller (spec §4.4).
//! - [`http`] — the external JSON/HTTP surface (spec §6), served by `axum`.

pub mod addr;
pub mod cluster;
pub mod config;
pub mod context;
pub mod data;
pub mod fault;
pub mod http;
pub mod observability;

pub use config::RouterConfig;
pub use context::RouterContext;
