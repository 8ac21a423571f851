//! Exact inner-product index over unit vectors.
//!
//! Row `i` is the embedding of chunk `i`. With normalised rows and queries
//! the inner product equals cosine similarity.
use anyhow::{bail, Result};

use tutor_core::traits::VectorIndex;
use tutor_core::types::SearchHit;

#[derive(Debug, Clone)]
pub struct FlatIpIndex {
    dim: usize,
    rows: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    /// Build from one vector per chunk, in chunk-id order.
    pub fn from_rows(dim: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if dim == 0 { bail!("index dimension must be positive"); }
        let rows = vectors.len();
        let mut data = Vec::with_capacity(rows * dim);
        for (i, v) in vectors.into_iter().enumerate() {
            if v.len() != dim { bail!("vector {} has dimension {}, expected {}", i, v.len(), dim); }
            data.extend(v);
        }
        Ok(Self { dim, rows, data })
    }
}

/// Sort key for scores: NaN ranks below every real score and `-0.0` ties with `0.0`.
fn rank(score: f32) -> f32 {
    if score.is_nan() { f32::NEG_INFINITY } else { score + 0.0 }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl VectorIndex for FlatIpIndex {
    fn len(&self) -> usize { self.rows }
    fn dim(&self) -> usize { self.dim }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dim { bail!("query has dimension {}, index expects {}", query.len(), self.dim); }
        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(id, row)| SearchHit { id, score: dot(row, query) })
            .collect();
        // Descending score; equal scores keep the lower chunk id first.
        hits.sort_by(|a, b| rank(b.score).total_cmp(&rank(a.score)).then(a.id.cmp(&b.id)));
        hits.truncate(k);
        Ok(hits)
    }
}
