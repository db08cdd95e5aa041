//! HTTP client for a llama.cpp-compatible completion server

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::response::answer_from_payload;
use super::Generator;
use super::GENERATION_PARAMS;
use crate::config::AppConfig;
use crate::errors::is_transient_status;
use crate::errors::RagchatError;
use crate::errors::Result;
use crate::retry::RetryPolicy;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stop: &'a [&'a str],
}

impl<'a> CompletionRequest<'a> {
    const fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            max_tokens: GENERATION_PARAMS.max_tokens,
            temperature: GENERATION_PARAMS.temperature,
            top_p: GENERATION_PARAMS.top_p,
            stop: GENERATION_PARAMS.stop,
        }
    }
}

/// Completion client with the fixed sampling parameters
pub struct LlmService {
    endpoint: String,
    client: Client,
    retry: RetryPolicy,
}

impl LlmService {
    /// Create a new LLM service from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.llm_timeout())
            .build()
            .map_err(|e| RagchatError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(
            config.llm_endpoint().to_string(),
            client,
            RetryPolicy::from_config(&config.retry),
        ))
    }

    /// Create from an already configured HTTP client
    pub fn with_client(endpoint: String, client: Client, retry: RetryPolicy) -> Self {
        Self {
            endpoint,
            client,
            retry,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one completion request and return the raw JSON payload
    pub async fn complete_raw(&self, prompt: &str) -> Result<Value> {
        debug!("Calling completion endpoint: {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&CompletionRequest::new(prompt))
            .send()
            .await
            .map_err(|e| RagchatError::GenerationUnavailable {
                message: format!("Failed to connect to LlamaCpp server: {e}"),
                transient: true,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RagchatError::GenerationUnavailable {
                message: format!("LlamaCpp server returned {}: {body}", status.as_u16()),
                transient: is_transient_status(status),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            RagchatError::generation(format!("Failed to parse LlamaCpp response: {e}"))
        })
    }
}

#[async_trait]
impl Generator for LlmService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = self
            .retry
            .run("completion request", || self.complete_raw(prompt))
            .await?;
        Ok(answer_from_payload(&payload))
    }
}
