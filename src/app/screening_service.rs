//! Suspicious-transaction screening.
//!
//! One invocation normalizes the caller's transactions, merges threshold
//! overrides over the configured defaults, validates the assembled request,
//! makes exactly one call to the reasoning service and validates its reply
//! against the [`ScreeningResult`] shape. Nothing is retried, cached or
//! persisted; every failure propagates to the caller.

use std::sync::Arc;

use validator::Validate;

use crate::domain::{
    AppError, ReasoningService, ResponseShapeError, ScreeningConfig, ScreeningRequest,
    ScreeningResult, ThresholdOverrides, Transaction, ValidationError,
};

use super::normalizer::normalize_transactions;
use super::prompt::render_prompt;

/// Orchestrates screening calls against a reasoning service
pub struct ComplianceScreener {
    reasoning: Arc<dyn ReasoningService>,
    config: ScreeningConfig,
}

impl ComplianceScreener {
    #[must_use]
    pub fn new(reasoning: Arc<dyn ReasoningService>, config: ScreeningConfig) -> Self {
        Self { reasoning, config }
    }

    /// Configured defaults applied when a caller omits overrides
    #[must_use]
    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    /// Assemble and validate the request that [`Self::screen`] would send.
    pub fn build_request(
        &self,
        transactions: &[Transaction],
        overrides: &ThresholdOverrides,
    ) -> Result<ScreeningRequest, AppError> {
        let request = ScreeningRequest {
            transactions: normalize_transactions(transactions),
            large_transaction_threshold: overrides
                .large_transaction_threshold
                .unwrap_or(self.config.large_transaction_threshold),
            exchange_rate_threshold: overrides
                .exchange_rate_threshold
                .unwrap_or(self.config.exchange_rate_threshold),
            unusual_behavior_description: overrides
                .unusual_behavior_description
                .clone()
                .or_else(|| self.config.unusual_behavior_description.clone()),
        };

        validate_request(&request)?;
        Ok(request)
    }

    /// Screen `transactions` and return the validated compliance result.
    pub async fn screen(
        &self,
        transactions: &[Transaction],
        overrides: &ThresholdOverrides,
    ) -> Result<ScreeningResult, AppError> {
        let request = self.build_request(transactions, overrides)?;
        let prompt = render_prompt(&request);
        let output = self.reasoning.generate(&request, &prompt).await?;
        parse_result(output)
    }
}

/// Validate a screening request before it is dispatched.
pub fn validate_request(request: &ScreeningRequest) -> Result<(), AppError> {
    ensure_finite(
        "largeTransactionThreshold",
        request.large_transaction_threshold,
    )?;
    ensure_finite("exchangeRateThreshold", request.exchange_rate_threshold)?;
    for (index, tx) in request.transactions.iter().enumerate() {
        ensure_finite(&format!("transactions[{}].amount", index), tx.amount)?;
        if let Some(rate) = tx.exchange_rate {
            ensure_finite(&format!("transactions[{}].exchangeRate", index), rate)?;
        }
    }

    request.validate()?;
    Ok(())
}

/// Validate the raw output of the reasoning service.
pub fn parse_result(output: Option<serde_json::Value>) -> Result<ScreeningResult, AppError> {
    let value = match output {
        None | Some(serde_json::Value::Null) => {
            return Err(ResponseShapeError::MissingOutput.into());
        }
        Some(value) => value,
    };

    serde_json::from_value(value)
        .map_err(|e| AppError::ResponseShape(ResponseShapeError::Malformed(e.to_string())))
}

fn ensure_finite(field: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() {
        return Ok(());
    }
    Err(AppError::Validation(ValidationError::InvalidField {
        field: field.to_string(),
        message: "must be a finite number".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FlaggedTransaction, ScreeningTransactionType, TransactionKind};
    use crate::test_utils::MockReasoningService;
    use serde_json::json;

    fn scenario() -> Vec<Transaction> {
        vec![
            Transaction::new("txn_a", TransactionKind::Deposit, "user_1", 50.0, 0.0),
            Transaction::new("txn_b", TransactionKind::Withdrawal, "user_1", 0.0, -1500.0),
            Transaction::new("txn_c", TransactionKind::Exchange, "user_2", -200.0, 0.0)
                .with_exchange_rate(0.24),
        ]
    }

    fn flagged_b() -> ScreeningResult {
        ScreeningResult {
            compliance_report: "One withdrawal exceeds the large-transaction threshold."
                .to_string(),
            flagged_transactions: vec![FlaggedTransaction {
                transaction_id: "txn_b".to_string(),
                reason: "exceeds large-transaction threshold".to_string(),
            }],
        }
    }

    #[test]
    fn test_defaults_apply_when_overrides_omitted() {
        let screener = ComplianceScreener::new(
            Arc::new(MockReasoningService::new()),
            ScreeningConfig::default(),
        );
        let request = screener
            .build_request(&scenario(), &ThresholdOverrides::default())
            .unwrap();

        assert_eq!(request.large_transaction_threshold, 1000.0);
        assert_eq!(request.exchange_rate_threshold, 0.2);
        assert!(request.unusual_behavior_description.is_none());
    }

    #[test]
    fn test_overrides_replace_configured_defaults() {
        let config = ScreeningConfig {
            unusual_behavior_description: Some("configured hint".to_string()),
            ..ScreeningConfig::default()
        };
        let screener = ComplianceScreener::new(Arc::new(MockReasoningService::new()), config);
        let overrides = ThresholdOverrides {
            large_transaction_threshold: Some(250.0),
            exchange_rate_threshold: None,
            unusual_behavior_description: Some("caller hint".to_string()),
        };

        let request = screener.build_request(&scenario(), &overrides).unwrap();
        assert_eq!(request.large_transaction_threshold, 250.0);
        assert_eq!(request.exchange_rate_threshold, 0.2);
        assert_eq!(
            request.unusual_behavior_description.as_deref(),
            Some("caller hint")
        );
    }

    #[tokio::test]
    async fn test_end_to_end_scenario_returns_result_unchanged() {
        let reasoning = Arc::new(MockReasoningService::returning_result(&flagged_b()));
        let screener = ComplianceScreener::new(reasoning.clone(), ScreeningConfig::default());

        let result = screener
            .screen(&scenario(), &ThresholdOverrides::default())
            .await
            .unwrap();
        assert_eq!(result, flagged_b());

        let sent = reasoning.last_request().unwrap();
        let amounts: Vec<f64> = sent.transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![50.0, 1500.0, 200.0]);
        let types: Vec<ScreeningTransactionType> =
            sent.transactions.iter().map(|t| t.transaction_type).collect();
        assert_eq!(
            types,
            vec![
                ScreeningTransactionType::Deposit,
                ScreeningTransactionType::Withdrawal,
                ScreeningTransactionType::Exchange,
            ]
        );
        assert_eq!(reasoning.call_count(), 1);
    }

    #[tokio::test]
    async fn test_negative_threshold_fails_before_dispatch() {
        let reasoning = Arc::new(MockReasoningService::returning_result(&flagged_b()));
        let screener = ComplianceScreener::new(reasoning.clone(), ScreeningConfig::default());
        let overrides = ThresholdOverrides {
            large_transaction_threshold: Some(-1.0),
            ..ThresholdOverrides::default()
        };

        let result = screener.screen(&scenario(), &overrides).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(reasoning.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_finite_threshold_fails_before_dispatch() {
        let reasoning = Arc::new(MockReasoningService::new());
        let screener = ComplianceScreener::new(reasoning.clone(), ScreeningConfig::default());
        let overrides = ThresholdOverrides {
            exchange_rate_threshold: Some(f64::NAN),
            ..ThresholdOverrides::default()
        };

        let result = screener.screen(&scenario(), &overrides).await;
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::InvalidField { ref field, .. }))
                if field == "exchangeRateThreshold"
        ));
        assert_eq!(reasoning.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_record_fails_before_dispatch() {
        let reasoning = Arc::new(MockReasoningService::new());
        let screener = ComplianceScreener::new(reasoning.clone(), ScreeningConfig::default());
        let records = vec![Transaction::new("", TransactionKind::Deposit, "user_1", 5.0, 0.0)];

        let result = screener
            .screen(&records, &ThresholdOverrides::default())
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(reasoning.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_report_is_response_shape_error() {
        let reasoning = Arc::new(MockReasoningService::returning(json!({
            "flaggedTransactions": []
        })));
        let screener = ComplianceScreener::new(reasoning, ScreeningConfig::default());

        let result = screener
            .screen(&scenario(), &ThresholdOverrides::default())
            .await;
        assert!(matches!(
            result,
            Err(AppError::ResponseShape(ResponseShapeError::Malformed(_)))
        ));
    }

    #[tokio::test]
    async fn test_absent_output_is_response_shape_error() {
        let reasoning = Arc::new(MockReasoningService::new());
        let screener = ComplianceScreener::new(reasoning.clone(), ScreeningConfig::default());

        let result = screener
            .screen(&scenario(), &ThresholdOverrides::default())
            .await;
        assert!(matches!(
            result,
            Err(AppError::ResponseShape(ResponseShapeError::MissingOutput))
        ));
        assert_eq!(reasoning.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let reasoning = Arc::new(MockReasoningService::failing("connection refused"));
        let screener = ComplianceScreener::new(reasoning, ScreeningConfig::default());

        let result = screener
            .screen(&scenario(), &ThresholdOverrides::default())
            .await;
        assert!(matches!(result, Err(AppError::Transport(_))));
    }

    #[tokio::test]
    async fn test_repeated_invocations_are_identical() {
        let reasoning = Arc::new(MockReasoningService::returning_result(&flagged_b()));
        let screener = ComplianceScreener::new(reasoning.clone(), ScreeningConfig::default());

        let first = screener
            .screen(&scenario(), &ThresholdOverrides::default())
            .await
            .unwrap();
        let second = screener
            .screen(&scenario(), &ThresholdOverrides::default())
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(reasoning.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch_is_still_dispatched() {
        let reasoning = Arc::new(MockReasoningService::returning(json!({
            "complianceReport": "Nothing to review.",
            "flaggedTransactions": []
        })));
        let screener = ComplianceScreener::new(reasoning.clone(), ScreeningConfig::default());

        let result = screener
            .screen(&[], &ThresholdOverrides::default())
            .await
            .unwrap();
        assert!(result.flagged_transactions.is_empty());
        assert_eq!(reasoning.call_count(), 1);
    }

    #[test]
    fn test_parse_result_treats_null_as_missing() {
        assert!(matches!(
            parse_result(Some(serde_json::Value::Null)),
            Err(AppError::ResponseShape(ResponseShapeError::MissingOutput))
        ));
    }
}
