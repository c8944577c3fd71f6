use offrag_core::error::{Error, Result};
use offrag_core::types::SearchHit;

/// Flat (exhaustive) L2 index. Vector `i` belongs to chunk offset `i`.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Self { Self { dim, data: Vec::new() } }

    /// Build from a full set of vectors; all must share the first vector's length.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let Some(first) = vectors.first() else {
            return Err(Error::EmptyCorpus { files: 0, failures: 0 });
        };
        let mut index = Self::new(first.len());
        index.data.reserve(vectors.len() * first.len());
        for v in vectors { index.add(v)?; }
        Ok(index)
    }

    /// Append one vector at the next offset.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        let offset = self.len();
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch { offset, expected: self.dim, actual: vector.len() });
        }
        self.data.extend_from_slice(vector);
        Ok(offset)
    }

    pub fn dim(&self) -> usize { self.dim }
    pub fn len(&self) -> usize { if self.dim == 0 { 0 } else { self.data.len() / self.dim } }
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn vector(&self, offset: usize) -> Option<&[f32]> {
        if offset >= self.len() { return None; }
        Some(&self.data[offset * self.dim..(offset + 1) * self.dim])
    }

    /// The `min(k, len)` nearest vectors by squared L2 distance, nearest first.
    ///
    /// Equal distances keep ascending offset order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { offset: 0, expected: self.dim, actual: query.len() });
        }
        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dim.max(1))
            .enumerate()
            .map(|(offset, v)| SearchHit { offset, distance: squared_l2(query, v) })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| { let d = x - y; d * d }).sum()
}
