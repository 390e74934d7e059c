//! HTTP surface of the worker process.
//!
//! One meaningful route: `POST /` takes `{"query": "..."}` and answers with
//! a reply envelope. `GET /health` is the readiness signal the gateway's
//! supervisor polls after spawning this process.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tally_core::{Envelope, QueryRequest};
use tally_llm::ExpenseChat;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Per-process state: the chat (and its ledger) behind a mutex, so queries
/// against the shared conversation history run one at a time.
pub struct WorkerState {
    chat: Mutex<ExpenseChat>,
}

impl WorkerState {
    pub fn new(chat: ExpenseChat) -> Self {
        Self { chat: Mutex::new(chat) }
    }
}

pub fn router(state: Arc<WorkerState>) -> Router {
    Router::new()
        .route("/", post(handle_query))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Handles one query. Request-level failures (malformed JSON) get a 500
/// error envelope; chat-level failures come back as a 200 error envelope,
/// mirroring how the chat module reports its own errors. The listener stays
/// up either way.
async fn handle_query(State(state): State<Arc<WorkerState>>, body: Bytes) -> Response {
    let request: QueryRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            error!("failed to parse request body: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(Envelope::error(e))).into_response();
        }
    };

    info!("processing query ({} chars)", request.query.len());

    let mut chat = state.chat.lock().await;
    match chat.interact(&request.query).await {
        Ok(reply) => (StatusCode::OK, Json(Envelope::success(reply))).into_response(),
        Err(e) => {
            error!("chat interaction failed: {}", e);
            (StatusCode::OK, Json(Envelope::error(e))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use http_body_util::BodyExt;
    use tally_core::EnvelopeStatus;
    use tally_llm::{ChatMessage, ChatProvider, Completion, LlmError};
    use tower::ServiceExt;

    use super::*;

    struct ScriptedProvider {
        responses: StdMutex<VecDeque<Completion>>,
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _tools: &[serde_json::Value],
        ) -> Result<Completion, LlmError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::Transport("script exhausted".into()))
        }
    }

    fn scripted_router(replies: Vec<&str>) -> Router {
        let responses = replies
            .into_iter()
            .map(|r| Completion { content: Some(r.to_string()), tool_calls: vec![] })
            .collect();
        let provider = Arc::new(ScriptedProvider { responses: StdMutex::new(responses) });
        let chat = ExpenseChat::new(provider);
        router(Arc::new(WorkerState::new(chat)))
    }

    fn query_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn envelope_from(response: Response) -> Envelope {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let app = scripted_router(vec![]);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn valid_query_returns_success_envelope() {
        let app = scripted_router(vec!["Alice owes Bob $5."]);
        let response = app
            .oneshot(query_request(r#"{"query":"who owes whom?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let envelope = envelope_from(response).await;
        assert_eq!(envelope.status, EnvelopeStatus::Success);
        assert_eq!(envelope.reply.as_deref(), Some("Alice owes Bob $5."));
    }

    #[tokio::test]
    async fn malformed_json_gets_500_error_envelope_and_listener_survives() {
        let app = scripted_router(vec!["still here"]);

        let response = app
            .clone()
            .oneshot(query_request("{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = envelope_from(response).await;
        assert_eq!(envelope.status, EnvelopeStatus::Error);
        assert!(envelope.message.is_some());

        // Same router still serves the next request.
        let response = app
            .oneshot(query_request(r#"{"query":"hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let envelope = envelope_from(response).await;
        assert_eq!(envelope.status, EnvelopeStatus::Success);
    }

    #[tokio::test]
    async fn chat_failure_becomes_error_envelope() {
        // Empty script: the provider errors on the first completion.
        let app = scripted_router(vec![]);
        let response = app
            .oneshot(query_request(r#"{"query":"hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let envelope = envelope_from(response).await;
        assert_eq!(envelope.status, EnvelopeStatus::Error);
        assert!(envelope.message.unwrap().contains("script exhausted"));
    }

    #[tokio::test]
    async fn non_post_on_query_route_is_405() {
        let app = scripted_router(vec![]);
        let response = app
            .oneshot(Request::builder().method(Method::GET).uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
