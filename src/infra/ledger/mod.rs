//! In-memory ledger standing in for the hosted account/transaction store.
//!
//! Accounts and transactions live in `DashMap`s for lock-free concurrent
//! reads. The ledger can be seeded from a JSON file at startup; nothing is
//! written back.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use tracing::info;

use crate::domain::{
    Account, AccountRepository, AppError, LedgerEntry, StorageError, Transaction,
    TransactionStore,
};

/// Shape of a ledger seed file
#[derive(Debug, Default, Deserialize)]
pub struct LedgerSeed {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Thread-safe in-memory implementation of the ledger collaborators
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: DashMap<String, Account>,
    transactions: DashMap<String, Transaction>,
    /// Collected fees; also guards entry commits
    house_balance: Mutex<f64>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from already-parsed seed data
    #[must_use]
    pub fn from_seed(seed: LedgerSeed) -> Self {
        let ledger = Self::new();
        for account in seed.accounts {
            ledger.insert_account(account);
        }
        for transaction in seed.transactions {
            ledger.insert_transaction(transaction);
        }
        ledger
    }

    /// Load a ledger from a JSON seed file
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Storage(StorageError::Seed(format!("{}: {}", path.display(), e)))
        })?;
        let seed: LedgerSeed = serde_json::from_str(&raw).map_err(|e| {
            AppError::Storage(StorageError::Seed(format!("{}: {}", path.display(), e)))
        })?;

        let ledger = Self::from_seed(seed);
        info!(
            accounts = ledger.accounts.len(),
            transactions = ledger.transactions.len(),
            path = %path.display(),
            "Ledger seeded"
        );
        Ok(ledger)
    }

    pub fn insert_account(&self, account: Account) {
        self.accounts.insert(account.user_id.clone(), account);
    }

    pub fn insert_transaction(&self, transaction: Transaction) {
        self.transactions.insert(transaction.id.clone(), transaction);
    }

    /// Fees collected so far
    #[must_use]
    pub fn house_balance(&self) -> f64 {
        self.house_balance.lock().map(|b| *b).unwrap_or_default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryLedger {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_transactions(&self, user_id: Option<&str>) -> Result<Vec<Transaction>, AppError> {
        let mut items: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| user_id.is_none_or(|owner| entry.user_id == owner))
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, AppError> {
        Ok(self.transactions.get(id).map(|entry| entry.value().clone()))
    }

    async fn record_transaction(&self, transaction: Transaction) -> Result<(), AppError> {
        self.insert_transaction(transaction);
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for InMemoryLedger {
    async fn get_account(&self, user_id: &str) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn save_account(&self, account: &Account) -> Result<(), AppError> {
        self.insert_account(account.clone());
        Ok(())
    }

    async fn commit_entry(&self, entry: &LedgerEntry) -> Result<f64, AppError> {
        let mut balance = self.house_balance.lock().map_err(|_| {
            AppError::Storage(StorageError::Unavailable(
                "house account lock poisoned".to_string(),
            ))
        })?;
        self.insert_account(entry.account.clone());
        self.insert_transaction(entry.transaction.clone());
        *balance += entry.house_fee;
        Ok(*balance)
    }
}
