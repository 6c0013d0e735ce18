// file: src/embedding/http.rs
// description: OpenAI-compatible embeddings endpoint client (blocking)
// reference: https://platform.openai.com/docs/api-reference/embeddings

use super::provider::{EmbeddingError, EmbeddingProvider, check_dimension};
use crate::config::EmbeddingConfig;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

pub struct HttpEmbeddingClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model_id: String,
    dimension: usize,
    batch_size: usize,
}

impl HttpEmbeddingClient {
    pub fn new(config: &EmbeddingConfig, model_id: impl Into<String>) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Request(format!("Failed to build HTTP client: {}", e)))?;

        let model_id = model_id.into();
        info!(
            "Initialized embeddings client for model {} at {}",
            model_id, config.api_url
        );

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model_id,
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
        })
    }

    fn request_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbeddingRequest {
            input: batch,
            model: &self.model_id,
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().map_err(|e| {
            EmbeddingError::Request(format!("Failed to send embeddings request: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EmbeddingError::Request(format!(
                "Embeddings request failed with status {}: {}",
                status, error_text
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().map_err(|e| {
            EmbeddingError::Generation(format!("Failed to parse embeddings response: {}", e))
        })?;

        if parsed.data.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: parsed.data.len(),
            });
        }

        // endpoints may answer out of order; `index` restores request order
        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));

        parsed
            .data
            .into_iter()
            .map(|d| {
                check_dimension(&d.embedding, self.dimension)?;
                Ok(d.embedding)
            })
            .collect()
    }
}

impl EmbeddingProvider for HttpEmbeddingClient {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let total_batches = texts.len().div_ceil(self.batch_size);
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            debug!("Embedding batch {}/{}", i + 1, total_batches);
            embeddings.extend(self.request_batch(batch)?);
        }

        Ok(embeddings)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }

        let mut vectors = self.request_batch(&[text.to_string()])?;
        vectors.pop().ok_or_else(|| {
            EmbeddingError::Generation("No embedding data returned".to_string())
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
