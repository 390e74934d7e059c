//! The tool-calling chat loop that connects the model to the ledger.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tally_ledger::{Ledger, Transaction};
use tracing::{info, warn};

use crate::tools::{expense_tools, SYSTEM_PROMPT};
use crate::{ChatMessage, ChatProvider, LlmError};

#[derive(Deserialize)]
struct AddTransactionsArgs {
    transactions: Vec<Transaction>,
}

/// Conversational front over the expense ledger.
///
/// Holds the conversation history and the ledger for the lifetime of the
/// worker process. One `interact` call is one user turn: the model may
/// request tool calls, which are dispatched against the ledger, and the
/// follow-up completion becomes the reply.
pub struct ExpenseChat {
    provider: Arc<dyn ChatProvider>,
    ledger: Ledger,
    messages: Vec<ChatMessage>,
}

impl ExpenseChat {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            ledger: Ledger::new(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT)],
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Processes one user query and returns the assistant's reply text.
    pub async fn interact(&mut self, user_input: &str) -> Result<String, LlmError> {
        self.messages.push(ChatMessage::user(user_input));
        let tools = expense_tools();

        let completion = self.provider.complete(&self.messages, &tools).await?;
        self.messages.push(ChatMessage::assistant_turn(
            completion.content.clone(),
            completion.tool_calls.clone(),
        ));

        if completion.tool_calls.is_empty() {
            return Ok(completion.content.unwrap_or_default());
        }

        for call in &completion.tool_calls {
            info!(tool = %call.function.name, "dispatching tool call");
            let result = self.dispatch(&call.function.name, &call.function.arguments);
            self.messages.push(ChatMessage::tool(&call.id, result.to_string()));
        }

        let followup = self.provider.complete(&self.messages, &tools).await?;
        let reply = followup.content.unwrap_or_default();
        self.messages.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    /// Executes one tool call against the ledger. Failures become error
    /// results for the model to read; they never abort the interaction.
    fn dispatch(&mut self, name: &str, arguments: &str) -> serde_json::Value {
        match name {
            "add_transactions" => match serde_json::from_str::<AddTransactionsArgs>(arguments) {
                Ok(args) => match self.ledger.add_transactions(&args.transactions) {
                    Ok(()) => json!({
                        "status": "success",
                        "message": "Transactions added successfully.",
                        "current_balances": self.ledger.balances(),
                    }),
                    Err(e) => json!({"status": "error", "message": e.to_string()}),
                },
                Err(e) => {
                    json!({"status": "error", "message": format!("invalid tool arguments: {e}")})
                }
            },
            "calculate_balances" => json!({
                "status": "success",
                "balances": self.ledger.balances(),
            }),
            other => {
                warn!(tool = %other, "model requested unknown tool");
                json!({"status": "error", "message": format!("unknown function: {other}")})
            }
        }
    }
}
