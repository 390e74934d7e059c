//! The relay handler: validate the query, make sure the worker is up,
//! forward the query, map the reply envelope to an HTTP response.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tally_core::{Envelope, QueryRequest};
use tracing::{error, info};

use crate::error::GatewayError;
use crate::state::GatewayState;

/// Successful gateway response body.
#[derive(Debug, Serialize)]
pub struct AssistantReply {
    #[serde(rename = "assistantResponse")]
    pub assistant_response: String,
}

pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/api/add-transactions", post(relay_query))
        .route("/api/calculate", post(relay_query))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Relays one query to the worker.
///
/// Client input errors are 400 and never touch the worker. Transport-level
/// failures are a generic 500, a worker error envelope is re-wrapped as a
/// 500 with its message, and timeouts surface as 504.
async fn relay_query(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> Result<Json<AssistantReply>, GatewayError> {
    let request: QueryRequest = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::BadRequest(format!("invalid request body: {e}")))?;
    if request.query.trim().is_empty() {
        return Err(GatewayError::BadRequest("query must be a non-empty string".into()));
    }

    state.supervisor.ensure_running().await?;

    let url = format!("{}/", state.supervisor.base_url());
    let response = state.http.post(&url).json(&request).send().await.map_err(|e| {
        error!("worker request failed: {}", e);
        if e.is_timeout() {
            GatewayError::Timeout(format!("worker request timed out: {e}"))
        } else {
            GatewayError::Unavailable(format!("worker request failed: {e}"))
        }
    })?;

    if !response.status().is_success() {
        return Err(GatewayError::Unavailable(format!(
            "worker returned status {}",
            response.status()
        )));
    }

    let envelope: Envelope = response
        .json()
        .await
        .map_err(|e| GatewayError::Unavailable(format!("malformed worker reply: {e}")))?;

    if envelope.is_success() {
        info!("relayed query successfully");
        Ok(Json(AssistantReply {
            assistant_response: envelope.reply.unwrap_or_default(),
        }))
    } else {
        Err(GatewayError::Worker(
            envelope
                .message
                .unwrap_or_else(|| "worker reported an unspecified error".into()),
        ))
    }
}
