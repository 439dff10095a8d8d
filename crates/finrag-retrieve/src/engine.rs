//! Retrieval engine: wires the chunker, embedder, and vector store together
//! and owns collection resolution on disk.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use finrag_chunk::Chunker;
use finrag_core::config::Settings;
use finrag_core::error::{Error, Result};
use finrag_core::traits::Embedder;
use finrag_core::types::{Chunk, CollectionKey, DocumentClass, Meta, ScoredPassage, SourceDocument};
use finrag_embed::default_embedder;
use finrag_index::{IndexStats, VectorStore};

use crate::ingest;

/// Base file name of the default (unscoped) index snapshot inside
/// `vector_db_path`.
const DEFAULT_INDEX_NAME: &str = "index";

/// Orchestrates ingestion and retrieval over one default store plus any
/// number of named collections. Holds no locks; callers serialize mutation.
pub struct Retriever {
    settings: Settings,
    chunker: Chunker,
    embedder: Box<dyn Embedder>,
    store: VectorStore,
}

impl Retriever {
    /// Engine with a fresh, empty default store. Fails when the embedding
    /// provider is selected but unconfigured.
    pub fn new(settings: Settings) -> Result<Self> {
        let chunker = Chunker::new(&settings);
        let embedder = default_embedder(&settings)?;
        let store = VectorStore::new(settings.embedding_dimension);
        Ok(Self { settings, chunker, embedder, store })
    }

    /// Engine with an injected embedder. Used by tests and callers that
    /// bring their own provider.
    pub fn with_embedder(settings: Settings, embedder: Box<dyn Embedder>) -> Self {
        let chunker = Chunker::new(&settings);
        let store = VectorStore::new(settings.embedding_dimension);
        Self { settings, chunker, embedder, store }
    }

    /// Engine whose default store is restored from the snapshot under
    /// `vector_db_path`. A missing snapshot yields an empty store.
    pub fn load_default(settings: Settings) -> Result<Self> {
        let mut engine = Self::new(settings)?;
        match VectorStore::load(&engine.default_base()) {
            Ok(store) => {
                info!(count = store.len(), "restored default index snapshot");
                engine.store = store;
            }
            Err(Error::NotFound(_)) => {
                debug!("no default index snapshot, starting empty");
            }
            Err(e) => return Err(e),
        }
        Ok(engine)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn default_base(&self) -> PathBuf {
        self.settings.vector_db_dir().join(DEFAULT_INDEX_NAME)
    }

    fn collection_base(&self, key: &CollectionKey) -> PathBuf {
        self.settings.vector_db_dir().join(key.to_string())
    }

    /// Chunk, embed, and index one document into the default store. Returns
    /// the number of chunks indexed (zero when the text cleans to nothing).
    pub fn ingest_document(&mut self, doc: SourceDocument) -> Result<usize> {
        let (text, metadata) = doc.into_parts();
        let chunks = chunk_text(&self.chunker, &self.settings, &text);
        index_chunks(self.embedder.as_ref(), &mut self.store, &chunks, &metadata)
    }

    /// Read a file, derive its metadata, and index it into the default store.
    pub fn ingest_file(&mut self, path: &Path, class: DocumentClass) -> Result<usize> {
        let doc = ingest::ingest_file(path, class, &self.chunker, &self.settings)?;
        index_chunks(self.embedder.as_ref(), &mut self.store, &doc.chunks, &doc.metadata)
    }

    /// Read a file and index it into the named collection, creating the
    /// collection when absent. The updated snapshot is written before
    /// returning, so a successful call is durable.
    pub fn ingest_file_into(
        &mut self,
        key: &CollectionKey,
        path: &Path,
        class: DocumentClass,
    ) -> Result<usize> {
        let doc = ingest::ingest_file(path, class, &self.chunker, &self.settings)?;

        let base = self.collection_base(key);
        let mut store = match VectorStore::load(&base) {
            Ok(store) => store,
            Err(Error::NotFound(_)) => VectorStore::new(self.settings.embedding_dimension),
            Err(e) => return Err(e),
        };

        let count = index_chunks(self.embedder.as_ref(), &mut store, &doc.chunks, &doc.metadata)?;
        store.save(&base)?;
        info!(collection = %key, chunks = count, "indexed document into collection");
        Ok(count)
    }

    /// Top-k passages for a pre-computed query vector against the default
    /// store. `k` falls back to the configured `top_k`.
    pub fn retrieve(&self, query: &[f32], k: Option<usize>) -> Result<Vec<ScoredPassage>> {
        self.store.search(query, k.unwrap_or(self.settings.top_k))
    }

    /// Embed a query string and search the default store.
    pub fn retrieve_text(&self, query: &str, k: Option<usize>) -> Result<Vec<ScoredPassage>> {
        let vector = self.embed_query(query)?;
        self.retrieve(&vector, k)
    }

    /// Embed a query string and search the named collection. A collection
    /// that was never built yields no passages rather than an error.
    pub fn retrieve_by_name(
        &self,
        key: &CollectionKey,
        query: &str,
        k: Option<usize>,
    ) -> Result<Vec<ScoredPassage>> {
        let store = match VectorStore::load(&self.collection_base(key)) {
            Ok(store) => store,
            Err(Error::NotFound(_)) => {
                debug!(collection = %key, "collection not found, returning no passages");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let vector = self.embed_query(query)?;
        store.search(&vector, k.unwrap_or(self.settings.top_k))
    }

    fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        if query.trim().is_empty() {
            return Err(Error::EmptyInput("query text is empty".to_string()));
        }
        let mut vectors = self.embedder.embed_batch(&[query.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| Error::Provider("provider returned no embedding for query".to_string()))
    }

    /// Snapshot the default store under `vector_db_path`.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.default_base())
    }

    pub fn stats(&self) -> IndexStats {
        self.store.stats()
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}

fn chunk_text(chunker: &Chunker, settings: &Settings, text: &str) -> Vec<Chunk> {
    chunker
        .chunk(text, settings.chunk_size, settings.chunk_overlap)
        .into_iter()
        .enumerate()
        .map(|(sequence_index, text)| Chunk { text, sequence_index })
        .collect()
}

/// Embed the chunk texts in provider batches and append them to the store,
/// every chunk carrying a copy of the document's metadata record.
fn index_chunks(
    embedder: &dyn Embedder,
    store: &mut VectorStore,
    chunks: &[Chunk],
    metadata: &Meta,
) -> Result<usize> {
    if chunks.is_empty() {
        return Ok(0);
    }
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts)?;
    let records = vec![metadata.clone(); texts.len()];
    store.add(&vectors, texts, Some(records))?;
    Ok(chunks.len())
}

/// Unique source filenames across the passages, first-occurrence order.
/// Passages without a `filename` record are skipped.
pub fn source_citations(passages: &[ScoredPassage]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for passage in passages {
        if let Some(name) = passage.metadata.get("filename") {
            if !name.is_empty() && !seen.iter().any(|s| s == name) {
                seen.push(name.clone());
            }
        }
    }
    seen
}
