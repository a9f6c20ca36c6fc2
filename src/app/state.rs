//! Application state management.

use std::sync::Arc;

use crate::domain::{AccountRepository, ReasoningService, ScreeningConfig, TransactionStore};

use super::screening_service::ComplianceScreener;
use super::service::AppService;
use super::wallet_service::WalletService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AppService>,
    pub wallet_service: Arc<WalletService>,
}

impl AppState {
    /// Create a new application state with the default screening thresholds
    #[must_use]
    pub fn new(
        transaction_store: Arc<dyn TransactionStore>,
        account_repository: Arc<dyn AccountRepository>,
        reasoning_service: Arc<dyn ReasoningService>,
    ) -> Self {
        Self::with_screening_config(
            transaction_store,
            account_repository,
            reasoning_service,
            ScreeningConfig::default(),
        )
    }

    /// Create a new application state with explicit screening defaults
    #[must_use]
    pub fn with_screening_config(
        transaction_store: Arc<dyn TransactionStore>,
        account_repository: Arc<dyn AccountRepository>,
        reasoning_service: Arc<dyn ReasoningService>,
        screening_config: ScreeningConfig,
    ) -> Self {
        let screener = Arc::new(ComplianceScreener::new(
            Arc::clone(&reasoning_service),
            screening_config,
        ));
        let wallet_service = Arc::new(WalletService::new(Arc::clone(&account_repository)));
        let service = Arc::new(AppService::new(
            transaction_store,
            account_repository,
            reasoning_service,
            screener,
        ));
        Self {
            service,
            wallet_service,
        }
    }
}
