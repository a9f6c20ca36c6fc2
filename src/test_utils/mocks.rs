//! Mock implementations for testing.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::domain::{
    Account, AccountRepository, AppError, LedgerEntry, ReasoningService, ScreeningPrompt,
    ScreeningRequest, ScreeningResult, StorageError, Transaction, TransactionStore,
    TransportError,
};
use crate::infra::InMemoryLedger;

/// What the mock reasoning service answers with
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Structured output, or none at all
    Output(Option<serde_json::Value>),
    /// Transport failure with the given message
    Failure(String),
}

/// Deterministic stand-in for the hosted reasoning service.
///
/// Records every request and prompt it receives and counts calls.
pub struct MockReasoningService {
    reply: Mutex<MockReply>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ScreeningRequest>>,
    last_prompt: Mutex<Option<ScreeningPrompt>>,
    is_healthy: AtomicBool,
}

impl MockReasoningService {
    /// A service that answers without any structured output
    #[must_use]
    pub fn new() -> Self {
        Self::with_reply(MockReply::Output(None))
    }

    #[must_use]
    pub fn with_reply(reply: MockReply) -> Self {
        Self {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            last_prompt: Mutex::new(None),
            is_healthy: AtomicBool::new(true),
        }
    }

    /// A service that answers with `output` verbatim
    #[must_use]
    pub fn returning(output: serde_json::Value) -> Self {
        Self::with_reply(MockReply::Output(Some(output)))
    }

    /// A service that answers with a well-formed `result`
    #[must_use]
    pub fn returning_result(result: &ScreeningResult) -> Self {
        Self::returning(serde_json::to_value(result).expect("result serializes"))
    }

    /// A service whose transport always fails
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(MockReply::Failure(message.into()))
    }

    pub fn set_reply(&self, reply: MockReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Number of `generate` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ScreeningRequest> {
        self.last_request.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<ScreeningPrompt> {
        self.last_prompt.lock().unwrap().clone()
    }
}

impl Default for MockReasoningService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningService for MockReasoningService {
    async fn generate(
        &self,
        request: &ScreeningRequest,
        prompt: &ScreeningPrompt,
    ) -> Result<Option<serde_json::Value>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        *self.last_prompt.lock().unwrap() = Some(prompt.clone());

        let reply = self.reply.lock().unwrap().clone();
        match reply {
            MockReply::Output(output) => Ok(output),
            MockReply::Failure(message) => {
                Err(AppError::Transport(TransportError::Network(message)))
            }
        }
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Transport(TransportError::Network(
                "Unhealthy".to_string(),
            )));
        }
        Ok(())
    }
}

/// In-memory ledger whose commits and health can be made to fail.
///
/// Reads and successful commits go to a wrapped [`InMemoryLedger`], so the
/// state left behind by a failed commit can be inspected.
pub struct MockLedger {
    inner: InMemoryLedger,
    fail_commits: AtomicBool,
    is_healthy: AtomicBool,
}

impl MockLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: InMemoryLedger::new(),
            fail_commits: AtomicBool::new(false),
            is_healthy: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn with_account(account: Account) -> Self {
        let ledger = Self::new();
        ledger.inner.insert_account(account);
        ledger
    }

    /// Make every `commit_entry` call fail without touching the ledger
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::Relaxed);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    pub fn house_balance(&self) -> f64 {
        self.inner.house_balance()
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for MockLedger {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Storage(StorageError::Unavailable(
                "Unhealthy".to_string(),
            )));
        }
        Ok(())
    }

    async fn list_transactions(&self, user_id: Option<&str>) -> Result<Vec<Transaction>, AppError> {
        self.inner.list_transactions(user_id).await
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, AppError> {
        self.inner.get_transaction(id).await
    }

    async fn record_transaction(&self, transaction: Transaction) -> Result<(), AppError> {
        self.inner.record_transaction(transaction).await
    }
}

#[async_trait]
impl AccountRepository for MockLedger {
    async fn get_account(&self, user_id: &str) -> Result<Option<Account>, AppError> {
        self.inner.get_account(user_id).await
    }

    async fn save_account(&self, account: &Account) -> Result<(), AppError> {
        self.inner.save_account(account).await
    }

    async fn commit_entry(&self, entry: &LedgerEntry) -> Result<f64, AppError> {
        if self.fail_commits.load(Ordering::Relaxed) {
            return Err(AppError::Storage(StorageError::Unavailable(
                "ledger write failed".to_string(),
            )));
        }
        self.inner.commit_entry(entry).await
    }
}
