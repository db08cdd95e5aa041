//! Text generation backend
//!
//! The completion server is reached through [`LlmService`]; the pipeline only
//! depends on the [`Generator`] trait so other backends (or fakes) can be
//! substituted.

pub mod client;
pub mod response;

use async_trait::async_trait;

pub use client::LlmService;
pub use response::clean_answer;
pub use response::extract_text;
pub use response::CompletionShape;
pub use response::NO_RESPONSE;

use crate::errors::Result;

/// Sampling parameters sent with every completion request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stop: &'static [&'static str],
}

pub const GENERATION_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 500,
    temperature: 0.7,
    top_p: 0.9,
    stop: &["\n\n", "Human:", "Assistant:"],
};

#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate an answer for `prompt`, already extracted and cleaned.
    ///
    /// Fails with `GenerationUnavailable` on transport errors and non-success
    /// responses; the message carries the status code and body.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
