//! Function schemas and system prompt offered to the model.

/// System prompt guiding the model's tool use for expense tracking.
pub const SYSTEM_PROMPT: &str = "\
You are a helpful expense tracking assistant that helps users manage group \
expenses and see who owes whom.

For adding expenses:
- Extract all expense details from the user's message.
- Package single or multiple expenses into the transactions array.
- Include the payer in receivers if they're part of the split.
- Use exact decimal amounts (e.g. \"10.50\" not \"10.5\" or \"$10.50\").

For showing balances:
- Explain the current state of debts in natural language.
- Positive balances mean money is owed TO that person.
- Negative balances mean money is owed BY that person.

Transfers are transactions where the payer is not included in the receivers \
list. For example, \"Charlie paid $15 to Alice for a shared ride\" becomes a \
transaction with payer \"Charlie\", amount \"15.00\", receivers [\"Alice\"].";

/// The two function schemas the assistant may call: add transactions to the
/// ledger, or calculate everyone's current balances.
pub fn expense_tools() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "type": "function",
            "function": {
                "name": "add_transactions",
                "description": "Add one or more expense transactions where people paid and others share the costs",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "transactions": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "payer": {
                                        "type": "string",
                                        "description": "Name of the person who paid (e.g., 'Alice')."
                                    },
                                    "amount": {
                                        "type": "string",
                                        "description": "Amount paid as a string in decimal format (e.g., '10.99')."
                                    },
                                    "receivers": {
                                        "type": "array",
                                        "items": {"type": "string"},
                                        "description": "People sharing the expense. For transfers, only the person receiving the payment."
                                    },
                                    "description": {
                                        "type": "string",
                                        "description": "Optional details about the transaction."
                                    }
                                },
                                "required": ["payer", "amount", "receivers"]
                            }
                        }
                    },
                    "required": ["transactions"],
                    "additionalProperties": false
                }
            }
        }),
        serde_json::json!({
            "type": "function",
            "function": {
                "name": "calculate_balances",
                "description": "Calculate the current balances for all participants. Positive means they are owed money, negative means they owe money",
                "parameters": {
                    "type": "object",
                    "properties": {},
                    "additionalProperties": false
                }
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_name_both_ledger_operations() {
        let tools = expense_tools();
        let names: Vec<&str> = tools
            .iter()
            .map(|t| t["function"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["add_transactions", "calculate_balances"]);
    }
}
