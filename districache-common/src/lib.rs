//! # districache-common
//!
//! Shared error kinds, tunable constants, and data shapes used by every
//! DistriCache crate. Nothing in here depends on tokio, axum, or a storage
//! engine — it is the contract the rest of the workspace builds against.

mod constants;
mod error;
mod stats;

pub use constants::*;
pub use error::{Error, Result};
pub use stats::{CacheStats, KeyWithTtl, NodeMetadata, RingStats};
