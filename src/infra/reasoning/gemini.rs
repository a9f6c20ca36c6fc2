//! Gemini reasoning service implementation.
//!
//! Sends the rendered screening instruction to the Generative Language API
//! and asks for a JSON reply constrained by the declared output schema.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, instrument};

use crate::domain::{
    AppError, FlaggedTransaction, ReasoningService, ResponseShapeError, SWEEPS_COIN_TO_USD_RATE,
    ScreeningPrompt, ScreeningRequest, ScreeningResult, TransportError,
};

/// Default Generative Language API base URL
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model used for screening
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default transport timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for [`GeminiReasoningClient`]
#[derive(Debug)]
pub struct GeminiConfig {
    /// API key; offline mode when absent
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_API_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.text.as_deref())
    }
}

/// Reasoning service backed by a hosted Gemini model
#[derive(Debug)]
pub struct GeminiReasoningClient {
    http_client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl GeminiReasoningClient {
    /// Create a new client.
    ///
    /// Without an API key the client runs in offline mode and answers with a
    /// deterministic rule-based screening instead of calling the model.
    pub fn new(config: GeminiConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Transport(TransportError::Configuration(e.to_string())))?;

        Ok(Self {
            http_client,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
        })
    }

    /// Check if running in offline mode (no API key configured)
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.api_key.is_none()
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn call_model(
        &self,
        api_key: &SecretString,
        prompt: &ScreeningPrompt,
    ) -> Result<Option<serde_json::Value>, AppError> {
        let url = self.generate_url();
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt.text }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": prompt.output_schema,
            }
        });

        debug!(url = %url, "Calling Gemini generateContent");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Gemini request failed");
                transport_error(&e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gemini API returned error");
            return Err(AppError::Transport(TransportError::ApiError {
                status_code: status.as_u16(),
                message: body,
            }));
        }

        let body = response.bytes().await.map_err(|e| {
            error!(error = %e, "Failed to read Gemini response body");
            transport_error(&e)
        })?;
        let envelope: GenerateContentResponse = serde_json::from_slice(&body).map_err(|e| {
            error!(error = %e, "Failed to parse Gemini response envelope");
            AppError::ResponseShape(ResponseShapeError::Malformed(e.to_string()))
        })?;

        let Some(text) = envelope.first_text() else {
            debug!("Gemini returned no candidate text");
            return Ok(None);
        };

        let output = serde_json::from_str(text).map_err(|e| {
            error!(error = %e, "Gemini candidate text is not JSON");
            AppError::ResponseShape(ResponseShapeError::Malformed(e.to_string()))
        })?;
        Ok(Some(output))
    }
}

#[async_trait]
impl ReasoningService for GeminiReasoningClient {
    #[instrument(
        skip(self, request, prompt),
        fields(model = %self.model, transactions = request.transactions.len())
    )]
    async fn generate(
        &self,
        request: &ScreeningRequest,
        prompt: &ScreeningPrompt,
    ) -> Result<Option<serde_json::Value>, AppError> {
        match &self.api_key {
            Some(api_key) => self.call_model(api_key, prompt).await,
            None => {
                let result = offline_screening(request);
                serde_json::to_value(&result)
                    .map(Some)
                    .map_err(|e| AppError::Internal(e.to_string()))
            }
        }
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let Some(api_key) = &self.api_key else {
            return Ok(());
        };

        let url = format!("{}/models/{}", self.base_url, self.model);
        let response = self
            .http_client
            .get(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(TransportError::ApiError {
                status_code: response.status().as_u16(),
                message: "model lookup failed".to_string(),
            }));
        }
        Ok(())
    }
}

/// Sending the request or reading the reply body failed before any
/// output could be inspected.
fn transport_error(e: &reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Transport(TransportError::Timeout(e.to_string()))
    } else {
        AppError::Transport(TransportError::Network(e.to_string()))
    }
}

/// Deterministic screening used when no model is configured.
///
/// Flags amounts above the large-transaction threshold and exchange rates
/// whose relative deviation from the platform rate exceeds the rate threshold.
#[must_use]
pub fn offline_screening(request: &ScreeningRequest) -> ScreeningResult {
    let mut flagged = Vec::new();

    for tx in &request.transactions {
        let mut reasons = Vec::new();
        if tx.amount > request.large_transaction_threshold {
            reasons.push(format!(
                "amount {} exceeds large-transaction threshold of {}",
                tx.amount, request.large_transaction_threshold
            ));
        }
        if let Some(rate) = tx.exchange_rate {
            let deviation = (rate - SWEEPS_COIN_TO_USD_RATE).abs() / SWEEPS_COIN_TO_USD_RATE;
            if deviation > request.exchange_rate_threshold {
                reasons.push(format!(
                    "exchange rate {} deviates from platform rate {} by more than {}",
                    rate, SWEEPS_COIN_TO_USD_RATE, request.exchange_rate_threshold
                ));
            }
        }
        if !reasons.is_empty() {
            flagged.push(FlaggedTransaction {
                transaction_id: tx.transaction_id.clone(),
                reason: reasons.join("; "),
            });
        }
    }

    let compliance_report = format!(
        "Offline rule-based screening of {} transaction(s): {} flagged for review.",
        request.transactions.len(),
        flagged.len()
    );

    ScreeningResult {
        compliance_report,
        flagged_transactions: flagged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScreeningTransaction, ScreeningTransactionType};

    fn entry(id: &str, amount: f64, rate: Option<f64>) -> ScreeningTransaction {
        ScreeningTransaction {
            transaction_id: id.to_string(),
            user_id: "user_1".to_string(),
            transaction_type: if rate.is_some() {
                ScreeningTransactionType::Exchange
            } else {
                ScreeningTransactionType::Withdrawal
            },
            amount,
            timestamp: "2024-05-01T00:00:00.000Z".to_string(),
            exchange_rate: rate,
        }
    }

    fn request(transactions: Vec<ScreeningTransaction>) -> ScreeningRequest {
        ScreeningRequest {
            transactions,
            large_transaction_threshold: 1000.0,
            exchange_rate_threshold: 0.2,
            unusual_behavior_description: None,
        }
    }

    #[test]
    fn test_offline_mode_without_api_key() {
        let client = GeminiReasoningClient::new(GeminiConfig::default()).unwrap();
        assert!(client.is_offline());

        let client = GeminiReasoningClient::new(GeminiConfig {
            api_key: Some(SecretString::from("key".to_string())),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert!(!client.is_offline());
    }

    #[test]
    fn test_generate_url_trims_trailing_slash() {
        let client = GeminiReasoningClient::new(GeminiConfig {
            base_url: "http://localhost:9000/v1beta/".to_string(),
            model: "gemini-test".to_string(),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.generate_url(),
            "http://localhost:9000/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_offline_flags_large_amounts() {
        let result = offline_screening(&request(vec![
            entry("small", 50.0, None),
            entry("large", 1500.0, None),
            entry("boundary", 1000.0, None),
        ]));
        assert_eq!(result.flagged_transactions.len(), 1);
        assert_eq!(result.flagged_transactions[0].transaction_id, "large");
    }

    #[test]
    fn test_offline_flags_deviating_exchange_rates() {
        let result = offline_screening(&request(vec![
            entry("at_rate", 200.0, Some(SWEEPS_COIN_TO_USD_RATE)),
            entry("off_rate", 200.0, Some(0.24)),
        ]));
        assert_eq!(result.flagged_transactions.len(), 1);
        assert_eq!(result.flagged_transactions[0].transaction_id, "off_rate");
        assert!(result.compliance_report.contains("2 transaction(s)"));
    }

    #[tokio::test]
    async fn test_generate_in_offline_mode_returns_valid_shape() {
        let client = GeminiReasoningClient::new(GeminiConfig::default()).unwrap();
        let req = request(vec![entry("large", 5000.0, None)]);
        let prompt = crate::app::render_prompt(&req);

        let output = client.generate(&req, &prompt).await.unwrap().unwrap();
        let parsed: ScreeningResult = serde_json::from_value(output).unwrap();
        assert_eq!(parsed.flagged_transactions[0].transaction_id, "large");
    }

    #[test]
    fn test_first_text_skips_non_text_parts() {
        let envelope: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": {} }, { "text": "{}" }] }
            }]
        }))
        .unwrap();
        assert_eq!(envelope.first_text(), Some("{}"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_text(), None);
    }
}
