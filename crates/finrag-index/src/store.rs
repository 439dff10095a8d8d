//! Vector store: flat index plus the parallel texts/metadata side-table.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use finrag_core::error::{Error, Result};
use finrag_core::types::{Meta, ScoredPassage};

use crate::flat::FlatIndex;
use crate::persist;

/// Owns an ordered, growable collection of (vector, text, metadata) triples.
/// Insertion position is the sole identity; there is no deletion or update.
///
/// Invariant: `index.len() == documents.len() == metadata.len()`. Violations
/// discovered while loading a stale snapshot are repaired by truncating or
/// padding metadata, never by failing the load.
pub struct VectorStore {
    index: Option<FlatIndex>,
    documents: Vec<String>,
    metadata: Vec<Meta>,
    dimension: usize,
}

/// Counters reported by [`VectorStore::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub num_documents: usize,
    pub dimension: usize,
    pub index_exists: bool,
}

impl VectorStore {
    /// Empty store. `dimension` is the configured expectation; the actual
    /// index dimension is fixed by the first built vector.
    pub fn new(dimension: usize) -> Self {
        Self { index: None, documents: Vec::new(), metadata: Vec::new(), dimension }
    }

    /// Build a fresh index from scratch, replacing any prior state. The index
    /// dimension is taken from the first vector.
    pub fn build(
        &mut self,
        vectors: &[Vec<f32>],
        documents: Vec<String>,
        metadata: Option<Vec<Meta>>,
    ) -> Result<()> {
        if vectors.is_empty() {
            return Err(Error::EmptyInput("cannot build index with empty embeddings".to_string()));
        }
        if vectors.len() != documents.len() {
            return Err(Error::Configuration(format!(
                "{} vectors but {} documents",
                vectors.len(),
                documents.len()
            )));
        }

        let dim = vectors[0].len();
        let mut index = FlatIndex::new(dim);
        index.add(vectors)?;

        self.dimension = dim;
        self.index = Some(index);
        self.metadata = conform_metadata(metadata, documents.len());
        self.documents = documents;
        Ok(())
    }

    /// Append to the existing collection; behaves as [`build`](Self::build)
    /// when no index exists yet. Missing or short metadata is padded with
    /// empty records rather than failing.
    pub fn add(
        &mut self,
        vectors: &[Vec<f32>],
        documents: Vec<String>,
        metadata: Option<Vec<Meta>>,
    ) -> Result<()> {
        let Some(index) = self.index.as_mut() else {
            return self.build(vectors, documents, metadata);
        };
        if vectors.len() != documents.len() {
            return Err(Error::Configuration(format!(
                "{} vectors but {} documents",
                vectors.len(),
                documents.len()
            )));
        }
        index.add(vectors)?;
        self.metadata.extend(conform_metadata(metadata, documents.len()));
        self.documents.extend(documents);
        Ok(())
    }

    /// Top-k passages by ascending squared-L2 distance. An empty or
    /// uninitialized store yields an empty result, never an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPassage>> {
        let Some(index) = self.index.as_ref() else {
            return Ok(Vec::new());
        };
        if self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let hits = index.search(query, k.min(self.documents.len()))?;
        let results = hits
            .into_iter()
            .filter(|(idx, _)| *idx < self.documents.len())
            .map(|(idx, distance)| ScoredPassage {
                text: self.documents[idx].clone(),
                metadata: self.metadata.get(idx).cloned().unwrap_or_default(),
                distance,
            })
            .collect();
        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.index.is_some()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            num_documents: self.documents.len(),
            dimension: self.dimension,
            index_exists: self.index.is_some(),
        }
    }

    /// Write the full snapshot: `<base>.fvec` (geometric index) and
    /// `<base>.json` (side-table). Parent directories are created; each file
    /// lands via rename, so a single call is all-or-nothing.
    pub fn save(&self, base: &Path) -> Result<()> {
        let (dim, raw): (usize, &[f32]) = match &self.index {
            Some(index) => (index.dim(), index.raw()),
            None => (self.dimension, &[]),
        };
        persist::write_vectors(&persist::vectors_path(base), dim, raw)?;
        persist::write_side_table(
            &persist::side_table_path(base),
            &persist::SideTable {
                documents: self.documents.clone(),
                metadata: self.metadata.clone(),
                dimension: dim,
            },
        )?;
        debug!(base = %base.display(), count = self.documents.len(), "saved index snapshot");
        Ok(())
    }

    /// Reconstruct a store from its snapshot. Fails with `Error::NotFound`
    /// when either companion file is missing. A side-table whose metadata
    /// length disagrees with the document count is repaired by truncating or
    /// padding with empty records.
    pub fn load(base: &Path) -> Result<Self> {
        let vec_path = persist::vectors_path(base);
        let table_path = persist::side_table_path(base);
        if !vec_path.exists() || !table_path.exists() {
            return Err(persist::not_found(base));
        }

        let (dim, raw) = persist::read_vectors(&vec_path).map_err(|e| match e {
            Error::Io(ref io) if persist::io_not_found(io) => persist::not_found(base),
            other => other,
        })?;
        let table = persist::read_side_table(&table_path).map_err(|e| match e {
            Error::Io(ref io) if persist::io_not_found(io) => persist::not_found(base),
            other => other,
        })?;

        let index = if raw.is_empty() && table.documents.is_empty() {
            None
        } else {
            Some(FlatIndex::from_raw(dim.max(1), raw)?)
        };

        let mut metadata = table.metadata;
        if metadata.len() != table.documents.len() {
            warn!(
                documents = table.documents.len(),
                metadata = metadata.len(),
                "repairing side-table metadata length"
            );
            metadata.resize(table.documents.len(), Meta::new());
        }

        Ok(Self {
            index,
            documents: table.documents,
            metadata,
            dimension: if dim > 0 { dim } else { table.dimension },
        })
    }
}

fn conform_metadata(metadata: Option<Vec<Meta>>, expected: usize) -> Vec<Meta> {
    match metadata {
        Some(mut m) => {
            if m.len() != expected {
                warn!(
                    supplied = m.len(),
                    expected, "metadata length mismatch, padding with empty records"
                );
                m.resize(expected, Meta::new());
            }
            m
        }
        None => vec![Meta::new(); expected],
    }
}
