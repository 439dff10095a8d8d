//! Domain types shared by the chunking, embedding, index, and retrieval crates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Per-document metadata record attached to every chunk at ingestion time.
/// Keys in practice: `filename`, `file_type`, `source`, `filing_type`.
pub type Meta = HashMap<String, String>;

/// A bounded span of one source document, the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Position of this chunk within its parent document (0-based).
    pub sequence_index: usize,
}

/// Caller-declared class of an input document. Auto-detection is deliberately
/// out of scope; the caller states what it is ingesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentClass {
    Filing,
    Transcript,
    News,
}

impl DocumentClass {
    /// The `file_type` metadata value recorded for this class.
    pub fn file_type(self) -> &'static str {
        match self {
            DocumentClass::Filing => "SEC_FILING",
            DocumentClass::Transcript => "TRANSCRIPT",
            DocumentClass::News => "NEWS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "filing" => Some(DocumentClass::Filing),
            "transcript" => Some(DocumentClass::Transcript),
            "news" => Some(DocumentClass::News),
            _ => None,
        }
    }
}

/// Input document as seen at the orchestrator boundary. Resolved exactly once
/// into `(text, metadata)`; nothing downstream re-checks the shape.
#[derive(Debug, Clone)]
pub enum SourceDocument {
    RawText(String),
    RetrievedChunk { text: String, metadata: Meta },
}

impl SourceDocument {
    pub fn into_parts(self) -> (String, Meta) {
        match self {
            SourceDocument::RawText(text) => (text, Meta::new()),
            SourceDocument::RetrievedChunk { text, metadata } => (text, metadata),
        }
    }
}

/// One retrieval hit. `distance` is squared Euclidean, so smaller is closer;
/// results are always ordered ascending by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub text: String,
    pub metadata: Meta,
    pub distance: f32,
}

/// Composite identifier scoping one independent vector index
/// (entity + document type + period). Renders as `TICKER_FILINGTYPE_YEAR`,
/// which is also the on-disk base name of the index snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionKey {
    pub ticker: String,
    pub filing_type: String,
    pub year: u16,
}

impl CollectionKey {
    pub fn new(ticker: impl Into<String>, filing_type: impl Into<String>, year: u16) -> Self {
        Self { ticker: ticker.into(), filing_type: filing_type.into(), year }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.ticker, self.filing_type, self.year)
    }
}

impl std::str::FromStr for CollectionKey {
    type Err = crate::error::Error;

    /// Parse `TICKER_FILINGTYPE_YEAR`. Filing types may contain `_`, so the
    /// ticker is the first segment and the year the last.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('_').collect();
        if parts.len() < 3 {
            return Err(crate::error::Error::Configuration(format!(
                "invalid collection name `{s}`, expected TICKER_FILINGTYPE_YEAR"
            )));
        }
        let year: u16 = parts[parts.len() - 1].parse().map_err(|_| {
            crate::error::Error::Configuration(format!(
                "invalid year in collection name `{s}`"
            ))
        })?;
        Ok(Self {
            ticker: parts[0].to_string(),
            filing_type: parts[1..parts.len() - 1].join("_"),
            year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_key_renders_base_name() {
        let key = CollectionKey::new("AAPL", "10-K", 2023);
        assert_eq!(key.to_string(), "AAPL_10-K_2023");
    }

    #[test]
    fn collection_key_parses_its_own_rendering() {
        let key: CollectionKey = "AAPL_10-K_2023".parse().expect("parse");
        assert_eq!(key, CollectionKey::new("AAPL", "10-K", 2023));
        assert!("AAPL_2023".parse::<CollectionKey>().is_err());
        assert!("AAPL_10-K_late".parse::<CollectionKey>().is_err());
    }

    #[test]
    fn source_document_resolves_once() {
        let (text, meta) = SourceDocument::RawText("body".to_string()).into_parts();
        assert_eq!(text, "body");
        assert!(meta.is_empty());

        let mut m = Meta::new();
        m.insert("filename".to_string(), "a.txt".to_string());
        let (text, meta) =
            SourceDocument::RetrievedChunk { text: "t".to_string(), metadata: m }.into_parts();
        assert_eq!(text, "t");
        assert_eq!(meta.get("filename").map(String::as_str), Some("a.txt"));
    }
}
