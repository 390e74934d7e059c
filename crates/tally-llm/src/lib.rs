//! LLM integration for the tally expense assistant.
//!
//! [`OpenAiClient`] talks to the chat-completions API; [`ExpenseChat`]
//! drives the tool-calling loop that lets the model read and mutate the
//! ledger. The [`ChatProvider`] trait is the seam between the two, so the
//! chat loop can be exercised against a scripted provider in tests.

mod chat;
mod openai;
mod tools;

pub use chat::ExpenseChat;
pub use openai::{ChatMessage, Completion, FunctionCall, OpenAiClient, Role, ToolCall};
pub use tools::{expense_tools, SYSTEM_PROMPT};

use async_trait::async_trait;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum LlmError {
    /// The API answered with a non-success status.
    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The request could not be sent or the response not received.
    #[error("LLM request failed: {0}")]
    Transport(String),

    /// The request exceeded the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The response body did not have the expected shape.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider seam
// ─────────────────────────────────────────────────────────────────────────────

/// A source of chat completions.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Requests one completion for the given conversation; `tools` are the
    /// function schemas offered to the model.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[serde_json::Value],
    ) -> Result<Completion, LlmError>;
}
