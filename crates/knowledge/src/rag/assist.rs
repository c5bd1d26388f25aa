//! Answering orchestration.
//!
//! Embeds the query, retrieves and selects documents, assembles the
//! conversation and runs the chat model.

use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::rag::conversation::{assemble_conversation, included_documents};
use crate::rag::links::collect_links;
use crate::selection::select_from_stream;
use crate::store::{create_store, DocumentStore};
use crate::types::{AnswerResult, DocumentRecord};
use assist_core::{AppConfig, AppError, AppResult, SamplingConfig};
use assist_llm::{create_client, generate, ChatClient};
use assist_prompt::{resolve_prompt, PromptDefinition};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Tunables of the answering pipeline.
#[derive(Debug, Clone)]
pub struct AssistOptions {
    /// Documents kept after filtering
    pub limit: usize,

    /// Descriptions this short or shorter are dropped
    pub min_description_chars: usize,

    /// Leading documents used as context and cited as links
    pub include_limit: usize,

    /// Chat requests allowed to run at once
    pub max_concurrent_generations: usize,

    /// Overrides the prompt's response language
    pub language: Option<String>,

    pub sampling: SamplingConfig,
}

impl AssistOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            limit: config.retrieval.limit,
            min_description_chars: config.retrieval.min_description_chars,
            include_limit: config.retrieval.include_limit,
            max_concurrent_generations: config.retrieval.max_concurrent_generations,
            language: config.prompt.language.clone(),
            sampling: config.sampling.clone(),
        }
    }
}

impl Default for AssistOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// The answering pipeline with its long-lived collaborators.
pub struct Assistant {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn DocumentStore>,
    chat: Arc<dyn ChatClient>,
    prompt: PromptDefinition,
    options: AssistOptions,
    generation_permits: Semaphore,
}

impl Assistant {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn DocumentStore>,
        chat: Arc<dyn ChatClient>,
        prompt: PromptDefinition,
        options: AssistOptions,
    ) -> Self {
        let permits = options.max_concurrent_generations.max(1);

        Self {
            embedder,
            store,
            chat,
            prompt,
            options,
            generation_permits: Semaphore::new(permits),
        }
    }

    /// Build every collaborator from configuration and load the chat model.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let prompt = resolve_prompt(config.prompt.dir.as_deref(), &config.prompt.id)?;

        let settings = config.embedding.clone();
        let embedder = tokio::task::spawn_blocking(move || create_provider(&settings))
            .await
            .map_err(|e| AppError::Embedding(format!("Embedding model loader failed: {}", e)))??;

        let store = create_store(&config.store, config.retrieval.oversample)?;

        let chat = create_client(&config.chat)?;
        chat.load().await?;

        tracing::info!(
            "Assistant ready (embedding: {}/{}, store: {}, chat: {}/{}, prompt: {})",
            embedder.provider_name(),
            embedder.model_name(),
            store.backend_name(),
            chat.provider_name(),
            chat.model_name(),
            prompt.id
        );

        Ok(Self::new(
            embedder,
            store,
            chat,
            prompt,
            AssistOptions::from_config(config),
        ))
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn chat_model(&self) -> &str {
        self.chat.model_name()
    }

    pub fn store_backend(&self) -> &str {
        self.store.backend_name()
    }

    pub fn options(&self) -> &AssistOptions {
        &self.options
    }

    /// Embed the query and select the closest informative documents.
    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<DocumentRecord>> {
        let started = Instant::now();
        let vector = self.embedder.embed(query).await?;
        tracing::debug!(
            "Embedded query into {} dimensions in {:.3}s",
            vector.len(),
            started.elapsed().as_secs_f64()
        );

        let started = Instant::now();
        let rows = self.store.search_stream(&vector, self.options.limit).await?;
        let selected =
            select_from_stream(rows, self.options.limit, self.options.min_description_chars)
                .await?;

        tracing::info!(
            "Retrieved {} documents in {:.3}s",
            selected.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(selected)
    }

    /// Answer a query with the documents it was grounded on.
    pub async fn answer(&self, query: &str) -> AppResult<AnswerResult> {
        let started = Instant::now();

        let selected = self.retrieve(query).await?;
        let conversation = assemble_conversation(
            &self.prompt,
            self.options.language.as_deref(),
            query,
            &selected,
            self.options.include_limit,
        )?;
        let links = collect_links(included_documents(&selected, self.options.include_limit));

        let conversation = {
            let _permit = self
                .generation_permits
                .acquire()
                .await
                .map_err(|_| AppError::Llm("Generation is shutting down".to_string()))?;
            generate(self.chat.as_ref(), conversation, &self.options.sampling).await?
        };

        let text = conversation
            .reply()
            .ok_or_else(|| AppError::Llm("Model returned no reply".to_string()))?
            .to_string();

        tracing::info!(
            "Answered in {:.2}s ({} links)",
            started.elapsed().as_secs_f64(),
            links.len()
        );

        Ok(AnswerResult { text, links })
    }

    /// Stop accepting generations and release the chat model.
    pub async fn shutdown(&self) -> AppResult<()> {
        self.generation_permits.close();
        self.chat.release().await
    }
}
