//! Benchmark-only crate; see `benches/` for the actual harnesses
//! (`cargo bench -p districache-bench`). No public API of its own.
