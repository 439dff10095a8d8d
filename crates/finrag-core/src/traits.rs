use crate::error::Result;

/// Boundary to the embedding provider: a sequence of strings in, one
/// fixed-dimension vector per string out, order preserved.
///
/// Implementations surface `Error::Configuration` for missing credentials,
/// `Error::QuotaExceeded` for billing exhaustion, and `Error::Provider` for
/// everything else upstream, so callers can choose retry behavior.
pub trait Embedder: Send + Sync {
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Compute embeddings for a batch of input texts.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
