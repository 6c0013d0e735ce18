// file: src/embedding/hashing.rs
// description: deterministic offline embedding based on token feature hashing
// reference: hashing trick for text vectorization

use super::provider::{EmbeddingError, EmbeddingProvider};
use tracing::debug;

/// Offline embedding provider.
///
/// Each lowercase alphanumeric token is hashed (FNV-1a) into one of `dimension`
/// buckets with a hash-derived sign, and the result is L2-normalised. Texts that
/// share vocabulary land close together, which is enough for tests and for
/// running without network access.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimension: usize,
    model_id: String,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_id: format!("hash-embedding-{}", dimension),
        }
    }

    pub fn with_model_id(dimension: usize, model_id: impl Into<String>) -> Self {
        Self {
            dimension,
            model_id: model_id.into(),
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(token.to_lowercase().as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
        (acc ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    })
}

impl EmbeddingProvider for HashEmbedding {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::InvalidInput(
                "dimension must be greater than 0".to_string(),
            ));
        }
        debug!("Hash-embedding {} documents", texts.len());
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::InvalidInput(
                "dimension must be greater than 0".to_string(),
            ));
        }
        Ok(self.vectorize(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_embedding_is_deterministic() {
        let provider = HashEmbedding::new(64);
        let a = provider.embed_query("fn main() { println!(\"hi\") }").unwrap();
        let b = provider.embed_query("fn main() { println!(\"hi\") }").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_embedding_is_normalized() {
        let provider = HashEmbedding::new(128);
        let v = provider.embed_query("semantic search over repositories").unwrap();
        let norm = dot(&v, &v).sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_blank_text_yields_zero_vector() {
        let provider = HashEmbedding::new(16);
        let v = provider.embed_query("   ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let provider = HashEmbedding::new(256);
        let query = provider.embed_query("calculate sum of numbers").unwrap();
        let near = provider
            .embed_query("def calculate_sum(a, b): return the sum of numbers")
            .unwrap();
        let far = provider.embed_query("user email address lookup").unwrap();
        assert!(dot(&query, &near) > dot(&query, &far));
    }

    #[test]
    fn test_batch_preserves_order() {
        let provider = HashEmbedding::new(32);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let batch = provider.embed_documents(&texts).unwrap();
        assert_eq!(batch[0], provider.embed_query("alpha").unwrap());
        assert_eq!(batch[1], provider.embed_query("beta").unwrap());
    }
}
