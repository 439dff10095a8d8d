//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `finrag.toml` + `finrag.<env>.toml` + `FINRAG_*` env
//! vars into one explicit [`Settings`] struct. The struct is constructed once
//! and passed by reference into component constructors; there is no ambient
//! global state.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Embedding provider API key. Empty means unconfigured.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible embeddings API.
    pub api_base: String,
    /// Embedding model identifier sent with every request.
    pub embedding_model: String,
    /// Expected embedding dimensionality.
    pub embedding_dimension: usize,
    /// Path to a `tokenizer.json` consistent with the generation model.
    /// When absent or unloadable, chunking falls back to characters.
    pub tokenizer_path: Option<String>,
    /// Token budget per chunk.
    pub chunk_size: usize,
    /// Token overlap between adjacent chunks.
    pub chunk_overlap: usize,
    /// Default number of passages to retrieve.
    pub top_k: usize,
    /// Directory holding vector index snapshots.
    pub vector_db_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimension: 1536,
            tokenizer_path: None,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            vector_db_path: "./data/vectorstore".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment =
            Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("finrag.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("finrag.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("finrag.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("finrag.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("FINRAG_"));

        let settings: Settings = figment
            .extract()
            .map_err(|e| Error::Configuration(format!("failed to load settings: {e}")))?;
        Ok(settings)
    }

    /// Whether an embedding credential is present at all.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Vector store directory with `~` and `${VAR}` expanded.
    pub fn vector_db_dir(&self) -> PathBuf {
        expand_path(&self.vector_db_path)
    }
}

// Credentials must never end up in logs; render a fixed marker instead.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &if self.has_api_key() { "<set>" } else { "<unset>" })
            .field("api_base", &self.api_base)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimension", &self.embedding_dimension)
            .field("tokenizer_path", &self.tokenizer_path)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("top_k", &self.top_k)
            .field("vector_db_path", &self.vector_db_path)
            .finish()
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
