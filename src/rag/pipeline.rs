//! Complete RAG pipeline: Embed -> Retrieve -> Assemble -> Generate

use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::ingest::load_index;
use super::ContextAssembler;
use super::PromptBuilder;
use super::SharedIndex;
use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingService;
use crate::errors::RagchatError;
use crate::errors::Result;
use crate::llm::Generator;
use crate::llm::LlmService;
use crate::models::QueryContext;

/// Reply for a blank question
pub const EMPTY_QUERY_REPLY: &str = "Please provide a question.";

/// Reply when the question could not be embedded
pub const EMBEDDING_FAILURE_REPLY: &str =
    "Sorry, I couldn't process your question. Please try again.";

/// Reply for every other failure
pub const GENERATION_FAILURE_REPLY: &str =
    "Sorry, I encountered an error while processing your question. Please try again.";

/// Question answering over the shared document index.
///
/// Every call is independent: the only shared state is the index, which is
/// read through an immutable snapshot per call.
pub struct RagService {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    index: SharedIndex,
    context_assembler: ContextAssembler,
    prompt_builder: PromptBuilder,
    top_k: NonZeroUsize,
}

impl RagService {
    /// Create from existing services
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        index: SharedIndex,
    ) -> Self {
        Self {
            embedder,
            generator,
            index,
            context_assembler: ContextAssembler::new(),
            prompt_builder: PromptBuilder::new(),
            top_k: super::DEFAULT_TOP_K,
        }
    }

    /// Build the HTTP-backed providers from configuration and load the index from `store`
    ///
    /// # Errors
    /// - Embedding or LLM client configuration errors
    /// - Database errors while listing embedded documents
    pub async fn from_config(config: &AppConfig, store: &dyn DocumentStore) -> Result<Self> {
        let embedder = Arc::new(EmbeddingService::new(config)?);
        let generator = Arc::new(LlmService::new(config)?);
        let index = load_index(store, config.embedding_dimension()).await?;
        info!("Loaded {} embedded documents into the index", index.len());

        Ok(Self::new(embedder, generator, SharedIndex::new(index)).with_top_k(config.top_k()))
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: NonZeroUsize) -> Self {
        self.top_k = top_k;
        self
    }

    pub const fn top_k(&self) -> NonZeroUsize {
        self.top_k
    }

    /// Handle for publishing index updates (see [`super::Ingestor`])
    pub const fn index(&self) -> &SharedIndex {
        &self.index
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::clone(&self.embedder)
    }

    /// Answer `query` using the configured number of documents.
    ///
    /// Never fails: every error is logged and turned into a fixed reply.
    pub async fn ask(&self, query: &str) -> String {
        self.ask_with_limit(query, self.top_k).await
    }

    /// Answer `query` using the `k` closest documents
    pub async fn ask_with_limit(&self, query: &str, k: NonZeroUsize) -> String {
        match self.ask_with_context(query, k).await {
            Ok(result) => result.answer,
            Err(e) => fallback_reply(&e).to_string(),
        }
    }

    /// Run the pipeline and keep every intermediate value.
    ///
    /// # Errors
    /// - `Validation` for a blank query (no provider is called)
    /// - `EmbeddingUnavailable` when the query cannot be embedded
    /// - `GenerationUnavailable` when the completion fails
    pub async fn ask_with_context(&self, query: &str, k: NonZeroUsize) -> Result<QueryContext> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Ignoring blank question");
            return Err(RagchatError::Validation("question is empty".to_string()));
        }

        debug!("Processing RAG query ({} chars)", query.chars().count());

        debug!("Step 1: Embedding query");
        let embedding = match self.embedder.embed(query).await {
            Ok(embedding) if !embedding.is_empty() => embedding,
            Ok(_) => {
                let e = RagchatError::embedding("embedding provider returned an empty vector");
                warn!(error = %e, "Failed to embed query");
                return Err(e);
            }
            Err(e) => {
                warn!(error = %e, "Failed to embed query");
                return Err(as_embedding_failure(e));
            }
        };

        debug!("Step 2: Retrieving documents");
        let retrieved = self.index.snapshot().query(&embedding, k);
        debug!("Retrieved {} documents", retrieved.len());

        debug!("Step 3: Assembling context");
        let context = self.context_assembler.assemble(&retrieved);
        let prompt = self.prompt_builder.build(query, &context);

        debug!("Step 4: Generating answer");
        let answer = match self.generator.generate(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "Failed to generate answer");
                return Err(as_generation_failure(e));
            }
        };

        info!("RAG query completed successfully");

        Ok(QueryContext {
            query: query.to_string(),
            embedding,
            retrieved,
            context,
            prompt,
            answer,
        })
    }
}

/// The user-facing reply for a failed pipeline run
pub fn fallback_reply(error: &RagchatError) -> &'static str {
    match error {
        RagchatError::Validation(_) => EMPTY_QUERY_REPLY,
        RagchatError::EmbeddingUnavailable { .. } => EMBEDDING_FAILURE_REPLY,
        _ => GENERATION_FAILURE_REPLY,
    }
}

fn as_embedding_failure(e: RagchatError) -> RagchatError {
    match e {
        RagchatError::EmbeddingUnavailable { .. } => e,
        other => RagchatError::embedding(other.to_string()),
    }
}

fn as_generation_failure(e: RagchatError) -> RagchatError {
    match e {
        RagchatError::GenerationUnavailable { .. } => e,
        other => RagchatError::generation(other.to_string()),
    }
}
