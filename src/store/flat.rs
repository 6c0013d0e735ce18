// file: src/store/flat.rs
// description: exact L2 vector index over contiguous f32 storage
// reference: brute-force nearest neighbour search

use crate::error::{IndexError, Result};

/// Brute-force L2 index. Vectors are addressed by insertion position.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Rebuild an index from row-major vector data.
    pub fn from_raw(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if dimension == 0 {
            return Err(IndexError::VectorIndex(
                "dimension must be greater than 0".to_string(),
            ));
        }
        if data.len() % dimension != 0 {
            return Err(IndexError::VectorIndex(format!(
                "{} values do not divide into vectors of dimension {}",
                data.len(),
                dimension
            )));
        }
        Ok(Self { dimension, data })
    }

    /// Append a vector and return its position.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dimension {
            return Err(IndexError::VectorIndex(format!(
                "Invalid dimension: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        self.data.extend_from_slice(vector);
        Ok(self.len() - 1)
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn raw(&self) -> &[f32] {
        &self.data
    }

    pub fn reconstruct(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// The `k` nearest positions to `query` by squared L2 distance, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(IndexError::VectorIndex(format!(
                "Invalid query dimension: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, vector)| (position, squared_l2(query, vector)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
