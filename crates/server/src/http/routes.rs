//! Request handlers.

use super::contract::{parse_request, AssistResponse};
use super::error::ApiError;
use super::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

/// `POST /assist`: validate the body and run the answering pipeline.
///
/// The body is taken raw so validation failures can be reported in the
/// `detail` format instead of the extractor's plain-text rejection.
pub async fn assist(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AssistResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("assist", request_id = %request_id);

    async move {
        let request = parse_request(&body)?;
        tracing::info!("Answering query ({} chars)", request.query.chars().count());

        let answer = state.assistant.answer(&request.query).await?;
        Ok::<_, ApiError>(Json(AssistResponse::from(answer)))
    }
    .instrument(span)
    .await
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub embedding_model: String,
    pub chat_model: String,
    pub store: String,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let assistant = &state.assistant;

    Json(HealthResponse {
        status: "ok",
        embedding_model: assistant.embedding_model().to_string(),
        chat_model: assistant.chat_model().to_string(),
        store: assistant.store_backend().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assist_knowledge::embeddings::HashingProvider;
    use assist_knowledge::store::memory::{MemoryStore, StoredDocument};
    use assist_knowledge::{AssistOptions, Assistant, DocumentRecord};
    use assist_llm::{ChatClient, MockChatClient};
    use assist_prompt::PromptDefinition;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn state(chat: Arc<dyn ChatClient>) -> AppState {
        let description = "Refunds are issued to the original card within five business days after the request is approved.";
        let documents = vec![StoredDocument {
            record: DocumentRecord {
                id: "1".to_string(),
                description: description.to_string(),
                url: "https://kb/refunds".to_string(),
                ..DocumentRecord::default()
            },
            embedding: vec![1.0; 16],
        }];

        let assistant = Assistant::new(
            Arc::new(HashingProvider::new(16, 512, false)),
            Arc::new(MemoryStore::new(documents, 500)),
            chat,
            PromptDefinition::builtin(),
            AssistOptions {
                min_description_chars: 50,
                ..AssistOptions::default()
            },
        );

        AppState::new(Arc::new(assistant))
    }

    async fn call(state: AppState, body: &'static [u8]) -> (StatusCode, Value) {
        let response: Response = assist(State(state), Bytes::from_static(body))
            .await
            .into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_answer() {
        let state = state(Arc::new(MockChatClient::new("Five business days.")));

        let (status, body) = call(state, br#"{"query": "How long do refunds take?"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"text": "Five business days.", "links": ["https://kb/refunds"]})
        );
    }

    #[tokio::test]
    async fn test_missing_query_is_422() {
        let chat = Arc::new(MockChatClient::default());
        let (status, body) = call(state(chat.clone()), br#"{"text": "hi"}"#).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let detail = body["detail"].as_array().unwrap();
        assert_eq!(detail.len(), 1);
        assert_eq!(detail[0]["loc"], json!(["body", "query"]));
        assert_eq!(detail[0]["type"], "missing");
        assert!(chat.requests().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_is_500() {
        let state = state(Arc::new(MockChatClient::failing("model unavailable")));

        let (status, body) = call(state, br#"{"query": "q"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"detail": "Internal Server Error"}));
    }

    #[tokio::test]
    async fn test_health() {
        let state = state(Arc::new(MockChatClient::default()));

        let Json(report) = health(State(state)).await;
        assert_eq!(report.status, "ok");
        assert_eq!(report.embedding_model, "hashing-v1");
        assert_eq!(report.chat_model, "mock-chat");
        assert_eq!(report.store, "memory");
    }

    #[test]
    fn test_router_builds() {
        let _router = crate::http::router(state(Arc::new(MockChatClient::default())));
    }
}
