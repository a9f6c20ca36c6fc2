//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::types::{Account, LedgerEntry, ScreeningRequest, Transaction};

/// Rendered instruction plus the output shape the service must reply in
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningPrompt {
    pub text: String,
    pub output_schema: serde_json::Value,
}

/// Hosted reasoning service that performs the actual screening
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Send one screening request and return the raw structured output.
    ///
    /// `Ok(None)` means the service answered without any structured output.
    async fn generate(
        &self,
        request: &ScreeningRequest,
        prompt: &ScreeningPrompt,
    ) -> Result<Option<serde_json::Value>, AppError>;

    /// Check service connectivity
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Source of materialized transaction records
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Check store connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// List transactions, newest first, optionally for a single owner
    async fn list_transactions(&self, user_id: Option<&str>) -> Result<Vec<Transaction>, AppError>;

    /// Get a single transaction by ID
    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, AppError>;

    /// Append a transaction to the history
    async fn record_transaction(&self, transaction: Transaction) -> Result<(), AppError>;
}

/// Account balances owned by the authentication/storage collaborator
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Get an account by owner ID
    async fn get_account(&self, user_id: &str) -> Result<Option<Account>, AppError>;

    /// Create or replace an account
    async fn save_account(&self, account: &Account) -> Result<(), AppError>;

    /// Store the entry's account, credit its fee to the house account and
    /// record its transaction, all or nothing. Returns the new house balance.
    async fn commit_entry(&self, entry: &LedgerEntry) -> Result<f64, AppError>;
}
