//! Exact nearest-neighbor vector index with snapshot persistence.
//!
//! [`FlatIndex`] is the geometric structure: an append-only, row-major
//! collection of fixed-dimension float32 vectors searched by brute-force
//! squared Euclidean distance. [`VectorStore`] pairs it with the parallel
//! `(texts, metadata)` side-table and owns the two-file snapshot layout.

pub mod flat;
mod persist;
pub mod store;

pub use flat::FlatIndex;
pub use store::{IndexStats, VectorStore};
