//! Embedding Gateway: obtains fixed-dimension vectors for batches of text
//! from an external provider, surfacing configuration and quota failures
//! distinctly from transient ones.

use finrag_core::config::Settings;
use finrag_core::error::Result;
use finrag_core::traits::Embedder;

pub mod fake;
pub mod openai;

pub use fake::FakeEmbedder;
pub use openai::OpenAiEmbedder;

/// Choose the embedder for this process. `FINRAG_USE_FAKE_EMBEDDINGS=1`
/// selects the deterministic fake for tests and offline development;
/// otherwise the remote provider is used and must be configured.
pub fn default_embedder(settings: &Settings) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("FINRAG_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        tracing::info!(dim = settings.embedding_dimension, "using deterministic fake embedder");
        return Ok(Box::new(FakeEmbedder::new(settings.embedding_dimension)));
    }
    Ok(Box::new(OpenAiEmbedder::new(settings)?))
}
