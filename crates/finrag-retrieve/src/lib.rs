//! Retrieval orchestrator: ingestion pipeline, query embedding, collection
//! resolution, and source citation handling.
//!
//! # Architecture
//!
//! ```text
//! Document -> Chunker -> Embedder -> VectorStore
//!                                        |
//! Query -> Embedder -> search <----------+
//!                        |
//!            ranked passages + citations
//! ```
//!
//! The store is a single mutable resource with no internal locking: at most
//! one writer at a time, and concurrent callers must serialize mutation
//! themselves. Persistence is a full snapshot, so a crash between a mutation
//! and the next save loses the unsaved increment.

pub mod engine;
pub mod ingest;

pub use engine::{source_citations, Retriever};
pub use ingest::{document_metadata, extract_text, IngestedDocument};
