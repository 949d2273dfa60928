//! Error kinds shared across the cache worker, the ring, the store, and the
//! router. These map 1:1 onto the error taxonomy in the design: the kinds
//! are deliberately coarse because callers branch on them, not on their
//! payloads.

use std::fmt;

/// Result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by DistriCache components.
///
/// Worker-local cache operations never fail (see `districache-cache`); this
/// enum exists for the ring, the store, and the router's coordination
/// logic.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key absent from both cache and store, or node absent from the ring.
    #[error("not found: {0}")]
    NotFound(String),

    /// A precondition on an argument was violated (e.g. non-positive capacity).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The router (or a component it depends on) has not been initialized,
    /// or the ring has no members to serve the request.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A durable-store operation failed.
    #[error("internal error: {0}")]
    Internal(String),

    /// The caller asked for something the system refuses on its current
    /// state (e.g. starting chaos without enough nodes).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A worker RPC timed out or the connection failed. Never surfaced to
    /// an external caller directly: reads collapse this to a cache miss,
    /// writes record it as a failed replication.
    #[error("transport error: {0}")]
    Transport(String),

    /// Synthesized by the partition map. Indistinguishable from
    /// [`Error::Transport`] to a caller, but tagged distinctly so
    /// `failed_replications` can report the real reason.
    #[error("partitioned: {0}")]
    Partitioned(String),
}

impl Error {
    /// Short machine-stable tag, useful for logging and for the
    /// `failed_replications[].reason` strings the router emits.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::ServiceUnavailable(_) => "service_unavailable",
            Error::Internal(_) => "internal",
            Error::BadRequest(_) => "bad_request",
            Error::Transport(_) => "transport",
            Error::Partitioned(_) => "partitioned",
        }
    }
}

/// Reason string recorded in a write path's `failed_replications` entry.
///
/// Kept distinct from [`Error`]'s `Display` because the wire format here is
/// part of the documented contract (spec §4.3.2), not a log message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationFailure {
    /// The router-to-target or inter-replica link is partitioned.
    Partitioned,
    /// The worker RPC itself failed (timeout, refused connection, protocol error).
    Transport(String),
}

impl fmt::Display for ReplicationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicationFailure::Partitioned => write!(f, "Network Unreachable (Partition)"),
            ReplicationFailure::Transport(detail) => write!(f, "Network Unreachable ({detail})"),
        }
    }
}
