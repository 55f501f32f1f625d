//! Benchmark support crate for eegraph.
//!
//! Provides a planted-group recording generator and ARI/NMI scoring of
//! partitions against the planted groups. The Criterion benchmarks under
//! `benches/` use these to time each pipeline stage.

pub mod error;
pub mod params;
pub mod quality;
pub mod source;
