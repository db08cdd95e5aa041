//! Embedding service: input validation, retries and output checks around the client

use async_trait::async_trait;
use tracing::debug;

use super::client::EmbeddingClient;
use super::Embedder;
use super::MAX_BATCH_SIZE;
use crate::config::AppConfig;
use crate::config::ProviderKind;
use crate::errors::RagchatError;
use crate::errors::Result;
use crate::retry::RetryPolicy;

/// Service for generating embeddings of a fixed dimension
pub struct EmbeddingService {
    client: EmbeddingClient,
    dimension: usize,
    retry: RetryPolicy,
}

impl EmbeddingService {
    /// Create a new embedding service
    ///
    /// # Errors
    /// - `ConfigError` when the provider needs an API key and none is configured
    pub fn new(config: &AppConfig) -> Result<Self> {
        if config.missing_embedding_api_key() {
            return Err(RagchatError::ConfigError(
                "OpenAI embeddings require an API key (embeddings.api_key or OPENAI_API_KEY)"
                    .to_string(),
            ));
        }

        let client = EmbeddingClient::new(
            config.embedding_provider(),
            config.embedding_model().to_string(),
            config.embedding_endpoint().to_string(),
            config.embedding_api_key().map(str::to_string),
            config.embedding_timeout(),
        )?;

        Ok(Self::from_client(
            client,
            config.embedding_dimension(),
            RetryPolicy::from_config(&config.retry),
        ))
    }

    pub const fn from_client(
        client: EmbeddingClient,
        dimension: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            dimension,
            retry,
        }
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Get the provider
    pub const fn provider(&self) -> ProviderKind {
        self.client.provider()
    }

    fn check_vector(&self, vector: Vec<f32>) -> Result<Vec<f32>> {
        if vector.is_empty() {
            return Err(RagchatError::embedding("Provider returned an empty embedding"));
        }
        if vector.len() != self.dimension {
            return Err(RagchatError::embedding(format!(
                "Provider returned {} dimensions, expected {}",
                vector.len(),
                self.dimension
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(RagchatError::embedding(
                "Provider returned non-finite embedding values",
            ));
        }
        Ok(vector)
    }
}

fn require_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RagchatError::Validation(
            "cannot embed empty text".to_string(),
        ));
    }
    Ok(trimmed)
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = require_text(text)?;
        let vector = self
            .retry
            .run("embedding request", || self.client.generate(text))
            .await?;
        self.check_vector(vector)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let texts = texts
            .iter()
            .map(|t| require_text(t))
            .collect::<Result<Vec<_>>>()?;

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH_SIZE) {
            debug!("Embedding batch of {} texts", chunk.len());
            let vectors = self
                .retry
                .run("batch embedding request", || {
                    self.client.generate_batch(chunk.to_vec())
                })
                .await?;
            for vector in vectors {
                embeddings.push(self.check_vector(vector)?);
            }
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
