//! File reading and per-document metadata derivation.

use std::fs;
use std::path::Path;

use finrag_chunk::Chunker;
use finrag_core::config::Settings;
use finrag_core::error::{Error, Result};
use finrag_core::types::{Chunk, DocumentClass, Meta};

/// Filing types recognized in `COMPANY_TYPE_YEAR` file stems.
const KNOWN_FILING_TYPES: [&str; 3] = ["10-K", "10-Q", "8-K"];

/// A chunked document plus the metadata record shared by all of its chunks.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub chunks: Vec<Chunk>,
    pub metadata: Meta,
}

/// Read a document's text. UTF-8 first, lossy re-read for files with stray
/// bytes. Empty content is a caller error, not a silent no-op.
pub fn extract_text(path: &Path) -> Result<String> {
    let text = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(format!("file not found: {}", path.display())));
        }
        Err(_) => String::from_utf8_lossy(&fs::read(path)?).to_string(),
    };
    if text.trim().is_empty() {
        return Err(Error::EmptyInput(format!("file appears to be empty: {}", path.display())));
    }
    Ok(text)
}

/// Metadata shared by every chunk of one document: filename, file type,
/// source path, and for filings the filing type when the stem encodes one.
pub fn document_metadata(path: &Path, class: DocumentClass) -> Meta {
    let mut meta = Meta::new();
    meta.insert(
        "filename".to_string(),
        path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
    );
    meta.insert("file_type".to_string(), class.file_type().to_string());
    meta.insert("source".to_string(), path.to_string_lossy().to_string());

    if class == DocumentClass::Filing {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if let Some(filing_type) = infer_filing_type(stem) {
                meta.insert("filing_type".to_string(), filing_type);
            }
        }
    }
    meta
}

/// Filing type from a `COMPANY_10-K_2023`-style stem: the second `_`-part if
/// it is a known type, `UNKNOWN` otherwise. Stems without at least two parts
/// carry no filing type at all.
fn infer_filing_type(stem: &str) -> Option<String> {
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 2 {
        return None;
    }
    if KNOWN_FILING_TYPES.contains(&parts[1]) {
        Some(parts[1].to_string())
    } else {
        Some("UNKNOWN".to_string())
    }
}

/// Read, clean, and chunk one document, pairing the chunks with the shared
/// metadata record.
pub fn ingest_file(
    path: &Path,
    class: DocumentClass,
    chunker: &Chunker,
    settings: &Settings,
) -> Result<IngestedDocument> {
    let text = extract_text(path)?;
    let metadata = document_metadata(path, class);
    let chunks = chunker
        .chunk(&text, settings.chunk_size, settings.chunk_overlap)
        .into_iter()
        .enumerate()
        .map(|(sequence_index, text)| Chunk { text, sequence_index })
        .collect();
    Ok(IngestedDocument { chunks, metadata })
}
