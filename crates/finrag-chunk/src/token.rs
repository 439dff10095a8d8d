//! Token-window chunking with a tokenizer consistent with the generation
//! model, falling back to character windows when tokenization is unavailable.

use tokenizers::Tokenizer;
use tracing::warn;

use finrag_core::config::Settings;

use crate::chars::chunk_by_chars;
use crate::clean::clean_text;

pub struct Chunker {
    tokenizer: Option<Tokenizer>,
}

impl Chunker {
    /// Build a chunker from settings, loading `tokenizer_path` when set.
    /// A missing or unloadable tokenizer degrades to the character strategy
    /// rather than failing ingestion.
    pub fn new(settings: &Settings) -> Self {
        let tokenizer = settings.tokenizer_path.as_deref().and_then(|path| {
            match Tokenizer::from_file(path) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!(path, error = %e, "tokenizer unavailable, falling back to character chunking");
                    None
                }
            }
        });
        Self { tokenizer }
    }

    /// Chunker with an explicit tokenizer (tests, embedded vocabularies).
    pub fn from_tokenizer(tokenizer: Tokenizer) -> Self {
        Self { tokenizer: Some(tokenizer) }
    }

    /// Chunker that only ever uses the character strategy.
    pub fn character_only() -> Self {
        Self { tokenizer: None }
    }

    pub fn has_tokenizer(&self) -> bool {
        self.tokenizer.is_some()
    }

    /// Split `text` into overlapping chunks of at most `chunk_size` tokens
    /// (characters under the fallback), adjacent chunks sharing `overlap`
    /// tokens. Cleaning happens first; empty cleaned input yields no chunks.
    pub fn chunk(&self, text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return Vec::new();
        }

        if let Some(tokenizer) = &self.tokenizer {
            match chunk_by_tokens(tokenizer, &cleaned, chunk_size, overlap) {
                Ok(chunks) => return chunks,
                Err(e) => {
                    warn!(error = %e, "token-based chunking failed, using character fallback");
                }
            }
        }
        chunk_by_chars(&cleaned, chunk_size, overlap)
    }
}

fn chunk_by_tokens(
    tokenizer: &Tokenizer,
    cleaned: &str,
    chunk_size: usize,
    overlap: usize,
) -> tokenizers::Result<Vec<String>> {
    let encoding = tokenizer.encode(cleaned, false)?;
    let ids = encoding.get_ids();
    let n = ids.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    // Inputs that fit one window come back verbatim; decoding would only
    // round-trip the same text through the vocabulary.
    if n <= chunk_size {
        return Ok(vec![cleaned.to_string()]);
    }

    // Clamp the stride so overlap >= chunk_size cannot stall the window.
    let stride = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < n {
        let end = (start + chunk_size).min(n);
        let piece = tokenizer.decode(&ids[start..end], true)?;
        chunks.push(piece);
        start += stride;
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokenizers::models::wordlevel::WordLevel;
    use tokenizers::pre_tokenizers::whitespace::WhitespaceSplit;

    /// Word-level tokenizer over a closed vocabulary; decode joins tokens
    /// with single spaces, so decode(encode(t)) == t for cleaned input.
    fn word_tokenizer(words: &[&str]) -> Tokenizer {
        let mut vocab: HashMap<String, u32> = HashMap::new();
        for (i, w) in words.iter().enumerate() {
            vocab.insert((*w).to_string(), i as u32);
        }
        vocab.insert("[UNK]".to_string(), words.len() as u32);
        let model = WordLevel::builder()
            .vocab(vocab)
            .unk_token("[UNK]".to_string())
            .build()
            .expect("word-level model");
        let mut tokenizer = Tokenizer::new(model);
        tokenizer.with_pre_tokenizer(WhitespaceSplit);
        tokenizer
    }

    fn numbered_words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("w{i}")).collect()
    }

    #[test]
    fn short_input_is_one_chunk_equal_to_cleaned_input() {
        let words = numbered_words(5);
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let chunker = Chunker::from_tokenizer(word_tokenizer(&refs));
        let text = format!("  {}  ", words.join("   "));
        let chunks = chunker.chunk(&text, 100, 10);
        assert_eq!(chunks, vec![words.join(" ")]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = Chunker::from_tokenizer(word_tokenizer(&["a"]));
        assert!(chunker.chunk("", 10, 2).is_empty());
        assert!(chunker.chunk("   \n ", 10, 2).is_empty());
    }

    #[test]
    fn token_windows_round_trip() {
        let words = numbered_words(23);
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let tokenizer = word_tokenizer(&refs);
        let chunker = Chunker::from_tokenizer(word_tokenizer(&refs));

        let text = words.join(" ");
        let (chunk_size, overlap) = (8usize, 3usize);
        let chunks = chunker.chunk(&text, chunk_size, overlap);
        assert!(chunks.len() > 1);

        // Re-concatenating with the overlap removed reconstructs the
        // original token sequence.
        let mut rebuilt: Vec<u32> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let ids = tokenizer.encode(chunk.as_str(), false).expect("encode").get_ids().to_vec();
            let skip = if i == 0 { 0 } else { overlap };
            rebuilt.extend(ids.into_iter().skip(skip));
        }
        let original = tokenizer.encode(text.as_str(), false).expect("encode").get_ids().to_vec();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn stride_clamps_when_overlap_not_smaller_than_chunk_size() {
        let words = numbered_words(12);
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let chunker = Chunker::from_tokenizer(word_tokenizer(&refs));
        let chunks = chunker.chunk(&words.join(" "), 4, 4);
        // Stride of 1: one window per starting token.
        assert_eq!(chunks.len(), 12);
    }

    #[test]
    fn character_only_falls_back() {
        let chunker = Chunker::character_only();
        assert!(!chunker.has_tokenizer());
        let chunks = chunker.chunk("plain text body", 100, 10);
        assert_eq!(chunks, vec!["plain text body".to_string()]);
    }
}
