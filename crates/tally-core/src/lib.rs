//! Core wire types shared between the tally gateway and worker.
//!
//! The gateway and worker exchange exactly one request/response pair per
//! query: a [`QueryRequest`] in, an [`Envelope`] out. Both binaries depend
//! on this crate so the shapes cannot drift apart.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Query
// ─────────────────────────────────────────────────────────────────────────────

/// A natural-language query about group expenses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reply envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome flag carried by every worker reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// The JSON envelope the worker returns for every query.
///
/// `reply` is set on success, `message` on error. Neither is persisted;
/// the envelope exists only for the duration of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    /// Builds a success envelope carrying the assistant's reply text.
    pub fn success(reply: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            reply: Some(reply.into()),
            message: None,
        }
    }

    /// Builds an error envelope carrying a human-readable message.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            reply: None,
            message: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_wire_shape() {
        let json = serde_json::to_value(Envelope::success("Alice owes Bob $5")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "success", "reply": "Alice owes Bob $5"})
        );
    }

    #[test]
    fn error_envelope_wire_shape() {
        let json = serde_json::to_value(Envelope::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "error", "message": "boom"}));
    }

    #[test]
    fn envelope_roundtrip_from_worker_json() {
        let env: Envelope =
            serde_json::from_str(r#"{"status":"success","reply":"X"}"#).unwrap();
        assert!(env.is_success());
        assert_eq!(env.reply.as_deref(), Some("X"));
        assert!(env.message.is_none());
    }
}
