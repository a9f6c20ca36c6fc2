//! Application service layer with graceful degradation.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::domain::{
    Account, AccountRepository, AppError, HealthResponse, HealthStatus, ReasoningService,
    ScreeningResult, ScreeningRunRequest, StorageError, Transaction, TransactionStore,
};

use super::screening_service::ComplianceScreener;

/// Application service containing business logic
pub struct AppService {
    transactions: Arc<dyn TransactionStore>,
    accounts: Arc<dyn AccountRepository>,
    reasoning: Arc<dyn ReasoningService>,
    screener: Arc<ComplianceScreener>,
}

impl AppService {
    #[must_use]
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        accounts: Arc<dyn AccountRepository>,
        reasoning: Arc<dyn ReasoningService>,
        screener: Arc<ComplianceScreener>,
    ) -> Self {
        Self {
            transactions,
            accounts,
            reasoning,
            screener,
        }
    }

    /// Run one screening pass.
    ///
    /// Screens the supplied transactions, or the full ledger when the caller
    /// supplies none.
    #[instrument(skip(self, run))]
    pub async fn run_screening(
        &self,
        run: &ScreeningRunRequest,
    ) -> Result<ScreeningResult, AppError> {
        let transactions = match &run.transactions {
            Some(supplied) => supplied.clone(),
            None => self.transactions.list_transactions(None).await?,
        };

        info!(count = transactions.len(), "Screening transactions");
        let result = self
            .screener
            .screen(&transactions, &run.overrides)
            .await
            .map_err(|e| {
                error!(error = %e, "Screening failed");
                e
            })?;

        info!(
            flagged = result.flagged_transactions.len(),
            "Screening complete"
        );
        Ok(result)
    }

    /// List transaction history, newest first
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<Transaction>, AppError> {
        self.transactions.list_transactions(user_id).await
    }

    /// Get a transaction by ID
    #[instrument(skip(self))]
    pub async fn get_transaction(&self, id: &str) -> Result<Transaction, AppError> {
        self.transactions
            .get_transaction(id)
            .await?
            .ok_or_else(|| AppError::Storage(StorageError::NotFound(id.to_string())))
    }

    /// Get account balances for display
    #[instrument(skip(self))]
    pub async fn get_account(&self, user_id: &str) -> Result<Account, AppError> {
        self.accounts
            .get_account(user_id)
            .await?
            .ok_or_else(|| AppError::Storage(StorageError::NotFound(user_id.to_string())))
    }

    /// Aggregate health of the ledger and the reasoning service
    pub async fn health_check(&self) -> HealthResponse {
        let ledger = match self.transactions.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                error!(error = %e, "Ledger health check failed");
                HealthStatus::Unhealthy
            }
        };
        let reasoning = match self.reasoning.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                error!(error = %e, "Reasoning service health check failed");
                HealthStatus::Unhealthy
            }
        };
        HealthResponse::new(ledger, reasoning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScreeningConfig, TransactionKind};
    use crate::infra::InMemoryLedger;
    use crate::test_utils::MockReasoningService;
    use serde_json::json;

    fn service(
        ledger: Arc<InMemoryLedger>,
        reasoning: Arc<MockReasoningService>,
    ) -> AppService {
        let screener = Arc::new(ComplianceScreener::new(
            reasoning.clone(),
            ScreeningConfig::default(),
        ));
        AppService::new(ledger.clone(), ledger, reasoning, screener)
    }

    #[tokio::test]
    async fn test_run_screening_defaults_to_full_ledger() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.insert_transaction(Transaction::new(
            "txn_1",
            TransactionKind::Deposit,
            "user_1",
            10.0,
            0.0,
        ));
        ledger.insert_transaction(Transaction::new(
            "txn_2",
            TransactionKind::Withdrawal,
            "user_2",
            0.0,
            -20.0,
        ));
        let reasoning = Arc::new(MockReasoningService::returning(json!({
            "complianceReport": "clean",
            "flaggedTransactions": []
        })));
        let service = service(ledger, reasoning.clone());

        service
            .run_screening(&ScreeningRunRequest::default())
            .await
            .unwrap();

        let sent = reasoning.last_request().unwrap();
        assert_eq!(sent.transactions.len(), 2);
    }

    #[tokio::test]
    async fn test_run_screening_uses_supplied_transactions() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.insert_transaction(Transaction::new(
            "stored",
            TransactionKind::Deposit,
            "user_1",
            10.0,
            0.0,
        ));
        let reasoning = Arc::new(MockReasoningService::returning(json!({
            "complianceReport": "clean",
            "flaggedTransactions": []
        })));
        let service = service(ledger, reasoning.clone());

        let run = ScreeningRunRequest {
            transactions: Some(vec![Transaction::new(
                "supplied",
                TransactionKind::Exchange,
                "user_9",
                -5.0,
                0.0,
            )]),
            ..ScreeningRunRequest::default()
        };
        service.run_screening(&run).await.unwrap();

        let sent = reasoning.last_request().unwrap();
        assert_eq!(sent.transactions.len(), 1);
        assert_eq!(sent.transactions[0].transaction_id, "supplied");
    }

    #[tokio::test]
    async fn test_get_missing_transaction_is_not_found() {
        let service = service(
            Arc::new(InMemoryLedger::new()),
            Arc::new(MockReasoningService::new()),
        );
        let result = service.get_transaction("nope").await;
        assert!(matches!(
            result,
            Err(AppError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_health_degrades_when_reasoning_unhealthy() {
        let reasoning = Arc::new(MockReasoningService::new());
        reasoning.set_healthy(false);
        let service = service(Arc::new(InMemoryLedger::new()), reasoning);

        let health = service.health_check().await;
        assert_eq!(health.ledger, HealthStatus::Healthy);
        assert_eq!(health.reasoning, HealthStatus::Unhealthy);
        assert_eq!(health.status, HealthStatus::Degraded);
    }
}
