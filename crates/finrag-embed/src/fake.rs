//! Deterministic embedder for tests and offline development.

use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use finrag_core::error::Result;
use finrag_core::traits::Embedder;

/// Hashed bag-of-words vectors: each whitespace token bumps one dimension
/// selected by its hash. Deterministic, L2-normalized, and cheap, which is
/// all the tests need.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_vector_per_input_in_order() {
        let embedder = FakeEmbedder::new(16);
        let texts = vec!["alpha".to_string(), "bravo charlie".to_string()];
        let out = embedder.embed_batch(&texts).expect("fake embedder never fails");
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.len() == 16));
    }

    #[test]
    fn deterministic_for_identical_input() {
        let embedder = FakeEmbedder::new(32);
        let a = embedder.embed_batch(&["same text".to_string()]).expect("embed");
        let b = embedder.embed_batch(&["same text".to_string()]).expect("embed");
        assert_eq!(a, b);
    }

    #[test]
    fn different_texts_differ() {
        let embedder = FakeEmbedder::new(64);
        let out = embedder
            .embed_batch(&["revenue grew".to_string(), "litigation risk".to_string()])
            .expect("embed");
        assert_ne!(out[0], out[1]);
    }
}
