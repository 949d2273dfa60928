//! # districache-proto
//!
//! Binary RPC protocol between the router and a cache worker: a RESP2-style
//! framing (`districache_proto::resp`) carrying a small tagged command set
//! (`districache_proto::message`), plus a pooled async client
//! (`districache_proto::client::WorkerClient`) the router uses to talk to
//! every worker on the ring.
//!
//! This is deliberately not JSON — the worker boundary is internal and
//! high-frequency, so it gets an allocation-conscious binary wire format
//! instead of the router's external, JSON-over-HTTP surface.

pub mod client;
pub mod message;
pub mod resp;

pub use client::{WorkerClient, WorkerClientConfig};
pub use message::{decode_request, decode_response, encode_request, encode_response, Request, Response};
pub use resp::{encode_value, read_value, write_frame, RespValue};
