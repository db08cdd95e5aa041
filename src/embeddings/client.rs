//! Embedding API clients for the supported providers

use futures::stream;
use futures::stream::StreamExt;
use reqwest::Client;
use reqwest::Response;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::ProviderKind;
use crate::errors::is_transient_status;
use crate::errors::RagchatError;
use crate::errors::Result;

/// Client for one embedding endpoint
pub struct EmbeddingClient {
    provider: ProviderKind,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    /// Create a new embedding client
    pub fn new(
        provider: ProviderKind,
        model: String,
        endpoint: String,
        api_key: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| RagchatError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            provider,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub const fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate embedding for a single text
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        match self.provider {
            ProviderKind::OpenAI => self
                .generate_openai(vec![text])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| RagchatError::embedding("No embedding in response")),
            ProviderKind::Ollama => self.generate_ollama(text).await,
        }
    }

    /// Generate embeddings for multiple texts, in input order
    pub async fn generate_batch(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        match self.provider {
            ProviderKind::OpenAI => self.generate_openai(texts).await,
            ProviderKind::Ollama => {
                // Ollama has no batch endpoint
                let concurrency = texts.len().clamp(1, 8);
                let results: Vec<Result<Vec<f32>>> = stream::iter(texts)
                    .map(|text| async move { self.generate_ollama(text).await })
                    .buffered(concurrency)
                    .collect()
                    .await;

                results.into_iter().collect()
            }
        }
    }

    /// Generate embeddings using the `OpenAI` API (single and batch share the request shape)
    async fn generate_openai(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| RagchatError::ConfigError("OpenAI API key not provided".to_string()))?;

        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            input: Vec<&'a str>,
            model: &'a str,
        }

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI embeddings API: {} ({} inputs)", url, texts.len());

        let expected = texts.len();
        let request = OpenAIRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response, "OpenAI").await?;
        let mut result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| RagchatError::embedding(format!("Failed to parse response: {e}")))?;

        if result.data.len() != expected {
            return Err(RagchatError::embedding(format!(
                "Expected {expected} embeddings, got {}",
                result.data.len()
            )));
        }
        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Generate embedding using Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response, "Ollama").await?;
        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| RagchatError::embedding(format!("Failed to parse response: {e}")))?;

        Ok(result.embedding)
    }
}

fn transport_error(e: reqwest::Error) -> RagchatError {
    RagchatError::EmbeddingUnavailable {
        message: format!("Embedding request failed: {e}"),
        transient: true,
    }
}

async fn check_status(response: Response, provider: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(RagchatError::EmbeddingUnavailable {
        message: format!("{provider} API error ({status}): {error_text}"),
        transient: is_transient_status(status),
    })
}
