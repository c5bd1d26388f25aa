//! Ollama chat provider implementation.
//!
//! This module provides integration with Ollama, a local LLM runtime.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{ChatClient, ChatReply, LlmUsage};
use crate::types::ChatMessage;
use assist_core::config::ChatSettings;
use assist_core::{AppError, AppResult, SamplingConfig};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CHAT_ENDPOINT: &str = "/api/chat";

/// Ollama `/api/chat` request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<serde_json::Value>,
}

/// Ollama model options derived from the sampling config.
#[derive(Debug, Serialize, PartialEq)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    repeat_penalty: f32,
}

/// Ollama `/api/chat` response format.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

/// Ollama chat client.
pub struct OllamaChatClient {
    /// Base URL for Ollama API
    base_url: String,

    /// Model name (e.g. "qwen2.5:7b")
    model: String,

    /// Keep-alive passed on every request
    keep_alive: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaChatClient {
    /// Create a client from chat settings.
    pub fn new(settings: &ChatSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client for Ollama: {}", e)))?;

        Ok(Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            keep_alive: settings.keep_alive.clone(),
            client,
        })
    }

    /// Map sampling parameters onto Ollama options.
    ///
    /// Greedy decoding (`do_sample = false`) becomes temperature 0 with top-k 1.
    /// Beam search has no Ollama counterpart.
    fn to_options(sampling: &SamplingConfig) -> OllamaOptions {
        if sampling.num_beams > 1 || sampling.early_stopping {
            tracing::debug!(
                "Ollama does not support beam search; num_beams={} early_stopping={} ignored",
                sampling.num_beams,
                sampling.early_stopping
            );
        }

        let (temperature, top_k) = if sampling.do_sample {
            (sampling.temperature, sampling.top_k)
        } else {
            (0.0, 1)
        };

        OllamaOptions {
            num_predict: sampling.max_new_tokens,
            temperature,
            top_k,
            top_p: sampling.top_p,
            repeat_penalty: sampling.repetition_penalty,
        }
    }

    /// Convert messages and sampling to an Ollama request.
    fn to_ollama_request(
        &self,
        messages: &[ChatMessage],
        sampling: &SamplingConfig,
    ) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            stream: false,
            options: Some(Self::to_options(sampling)),
            keep_alive: self.keep_alive.clone().map(serde_json::Value::String),
        }
    }

    /// Convert Ollama response to a chat reply.
    fn convert_response(&self, response: OllamaChatResponse) -> AppResult<ChatReply> {
        let message = response
            .message
            .ok_or_else(|| AppError::Llm("Ollama response contained no message".to_string()))?;

        Ok(ChatReply {
            content: message.content,
            model: response.model,
            usage: LlmUsage::new(
                response.prompt_eval_count.unwrap_or(0),
                response.eval_count.unwrap_or(0),
            ),
        })
    }

    /// Send a request and decode the single JSON response object.
    async fn send(&self, request: &OllamaChatRequest) -> AppResult<OllamaChatResponse> {
        let url = format!("{}{}", self.base_url, CHAT_ENDPOINT);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if status == StatusCode::NOT_FOUND {
                return Err(AppError::Llm(format!(
                    "Ollama model '{}' is not available ({}). Run: ollama pull {}",
                    self.model, error_text, self.model
                )));
            }

            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))
    }

    /// Request with no messages: Ollama only loads or unloads the model.
    fn lifecycle_request(&self, keep_alive: Option<serde_json::Value>) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model.clone(),
            messages: Vec::new(),
            stream: false,
            options: None,
            keep_alive,
        }
    }
}

#[async_trait::async_trait]
impl ChatClient for OllamaChatClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        sampling: &SamplingConfig,
    ) -> AppResult<ChatReply> {
        tracing::info!("Sending chat request to Ollama");

        let request = self.to_ollama_request(messages, sampling);
        tracing::debug!("Options: {:?}", request.options);

        let response = self.send(&request).await?;

        tracing::info!("Received reply from Ollama");

        self.convert_response(response)
    }

    async fn load(&self) -> AppResult<()> {
        tracing::info!("Loading chat model '{}' in Ollama at {}", self.model, self.base_url);

        let keep_alive = self.keep_alive.clone().map(serde_json::Value::String);
        self.send(&self.lifecycle_request(keep_alive)).await?;

        tracing::info!("Chat model '{}' loaded", self.model);
        Ok(())
    }

    async fn release(&self) -> AppResult<()> {
        tracing::info!("Unloading chat model '{}'", self.model);

        self.send(&self.lifecycle_request(Some(serde_json::json!(0))))
            .await?;
        Ok(())
    }
}
