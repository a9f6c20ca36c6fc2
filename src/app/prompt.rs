//! Screening instruction rendering and the declared output schema.

use serde_json::json;

use crate::domain::{ScreeningPrompt, ScreeningRequest, ScreeningTransaction};

/// Render the instruction sent to the reasoning service for `request`.
#[must_use]
pub fn render_prompt(request: &ScreeningRequest) -> ScreeningPrompt {
    ScreeningPrompt {
        text: render_text(request),
        output_schema: output_schema(),
    }
}

const PREAMBLE: &str = "You are a compliance officer tasked with analyzing transactions \
for a sweeps coin exchange.

Your goal is to identify any unusual, suspicious, or large transactions that may require \
further investigation.

Here are the transactions to analyze:
";

const CLOSING: &str = "
Generate a compliance report summarizing your findings and flag any transactions that \
warrant further investigation.
Include the transactionId and the reason it was flagged.
";

fn transaction_line(tx: &ScreeningTransaction) -> String {
    let mut line = format!(
        "- Transaction ID: {}, User ID: {}, Type: {}, Amount: {}, Timestamp: {}",
        tx.transaction_id, tx.user_id, tx.transaction_type, tx.amount, tx.timestamp
    );
    if let Some(rate) = tx.exchange_rate {
        line.push_str(&format!(", Exchange Rate: {}", rate));
    }
    line.push('\n');
    line
}

fn render_text(request: &ScreeningRequest) -> String {
    let mut text = String::from(PREAMBLE);
    text.extend(request.transactions.iter().map(transaction_line));

    text.push_str(&format!(
        "\nConsider the following factors when analyzing transactions:\n\
         - Large transactions exceeding the threshold of ${}.\n\
         - Unusual exchange rates that deviate by more than {} from the norm.\n\
         - Any other suspicious patterns or anomalies in the transaction data.\n",
        request.large_transaction_threshold, request.exchange_rate_threshold
    ));
    if let Some(hint) = &request.unusual_behavior_description {
        text.push_str(&format!("- {}\n", hint));
    }

    text.push_str(CLOSING);
    text
}

/// JSON schema of a screening result, in the subset the hosted model accepts.
#[must_use]
pub fn output_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "complianceReport": {
                "type": "STRING",
                "description": "A detailed report of any suspicious transactions."
            },
            "flaggedTransactions": {
                "type": "ARRAY",
                "description": "Flagged transactions with reasons.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "transactionId": {
                            "type": "STRING",
                            "description": "The unique ID of the flagged transaction."
                        },
                        "reason": {
                            "type": "STRING",
                            "description": "The reason why the transaction was flagged."
                        }
                    },
                    "required": ["transactionId", "reason"]
                }
            }
        },
        "required": ["complianceReport", "flaggedTransactions"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScreeningTransactionType;

    fn entry(id: &str, kind: ScreeningTransactionType, amount: f64) -> ScreeningTransaction {
        ScreeningTransaction {
            transaction_id: id.to_string(),
            user_id: "user_7".to_string(),
            transaction_type: kind,
            amount,
            timestamp: "2024-05-01T12:00:00.000Z".to_string(),
            exchange_rate: None,
        }
    }

    fn request() -> ScreeningRequest {
        let mut exchange = entry("txn_c", ScreeningTransactionType::Exchange, 200.0);
        exchange.exchange_rate = Some(0.24);
        ScreeningRequest {
            transactions: vec![
                entry("txn_a", ScreeningTransactionType::Deposit, 50.0),
                exchange,
            ],
            large_transaction_threshold: 1000.0,
            exchange_rate_threshold: 0.2,
            unusual_behavior_description: Some(
                "Flag users making multiple large withdrawals in a short period.".to_string(),
            ),
        }
    }

    #[test]
    fn test_prompt_lists_every_transaction_field() {
        let prompt = render_prompt(&request());
        assert!(prompt.text.contains(
            "- Transaction ID: txn_a, User ID: user_7, Type: deposit, Amount: 50, \
             Timestamp: 2024-05-01T12:00:00.000Z\n"
        ));
        assert!(prompt.text.contains("Transaction ID: txn_c"));
        assert!(prompt.text.contains("Type: exchange, Amount: 200"));
        assert!(prompt.text.contains(", Exchange Rate: 0.24"));
    }

    #[test]
    fn test_exchange_rate_omitted_when_absent() {
        let prompt = render_prompt(&request());
        let line = prompt
            .text
            .lines()
            .find(|l| l.contains("txn_a"))
            .unwrap();
        assert!(!line.contains("Exchange Rate"));
    }

    #[test]
    fn test_prompt_states_thresholds_and_hint() {
        let prompt = render_prompt(&request());
        assert!(prompt.text.contains("threshold of $1000"));
        assert!(prompt.text.contains("more than 0.2 from the norm"));
        assert!(
            prompt
                .text
                .contains("- Flag users making multiple large withdrawals in a short period.")
        );
    }

    #[test]
    fn test_hint_line_absent_without_description() {
        let mut req = request();
        req.unusual_behavior_description = None;
        let prompt = render_prompt(&req);
        assert!(!prompt.text.contains("large withdrawals in a short period"));
    }

    #[test]
    fn test_output_schema_requires_report_and_flags() {
        let schema = output_schema();
        assert_eq!(
            schema["required"],
            json!(["complianceReport", "flaggedTransactions"])
        );
        assert_eq!(
            schema["properties"]["flaggedTransactions"]["items"]["required"],
            json!(["transactionId", "reason"])
        );
    }
}
