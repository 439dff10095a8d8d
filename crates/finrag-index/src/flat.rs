//! Brute-force squared-L2 index over float32 vectors.

use finrag_core::error::{Error, Result};

/// Exact flat index: row-major storage, insertion position is the identity.
/// No deletion, no update in place, no normalization; callers wanting cosine
/// ranking normalize their vectors before insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    /// Rebuild from a raw row-major payload, e.g. a snapshot file.
    pub fn from_raw(dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 {
            return Err(Error::Configuration("index dimension must be non-zero".to_string()));
        }
        if data.len() % dim != 0 {
            return Err(Error::Configuration(format!(
                "raw payload of {} floats is not a multiple of dimension {dim}",
                data.len()
            )));
        }
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn raw(&self) -> &[f32] {
        &self.data
    }

    /// Append vectors in order. Every row must match the index dimension;
    /// a mismatch means the embedding configuration and the index disagree.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for v in vectors {
            if v.len() != self.dim {
                return Err(Error::Configuration(format!(
                    "vector dimension {} does not match index dimension {}",
                    v.len(),
                    self.dim
                )));
            }
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    /// Stored vector at insertion position `i`.
    pub fn vector(&self, i: usize) -> Option<&[f32]> {
        let start = i.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    /// Top-k nearest rows by squared Euclidean distance, ascending. Ties keep
    /// insertion order. An empty index yields an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(Error::Configuration(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dim
            )));
        }
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, row)| (i, squared_l2(query, row)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k.min(self.len()));
        Ok(scored)
    }
}

/// Squared Euclidean distance. Squared on purpose: ordering is identical to
/// the true metric and the square root would be wasted per row.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let d = x - y;
        sum += d * d;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_l2_basics() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn search_empty_index_is_empty_not_error() {
        let index = FlatIndex::new(4);
        let hits = index.search(&[0.0; 4], 5).expect("empty index searches fine");
        assert!(hits.is_empty());
    }

    #[test]
    fn add_rejects_dimension_mismatch() {
        let mut index = FlatIndex::new(3);
        let err = index.add(&[vec![1.0, 2.0]]).err().expect("must reject");
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(index.len(), 0, "rejected batch must not partially land");
    }

    #[test]
    fn search_orders_ascending_with_exact_match_first() {
        let mut index = FlatIndex::new(2);
        index.add(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![5.0, 5.0]]).expect("add");
        let hits = index.search(&[1.0, 0.0], 3).expect("search");
        assert_eq!(hits[0], (1, 0.0));
        assert!(hits[0].1 <= hits[1].1 && hits[1].1 <= hits[2].1);
    }

    #[test]
    fn from_raw_validates_payload_shape() {
        assert!(FlatIndex::from_raw(3, vec![0.0; 7]).is_err());
        let index = FlatIndex::from_raw(3, vec![0.0; 9]).expect("3x3 payload");
        assert_eq!(index.len(), 3);
    }
}
