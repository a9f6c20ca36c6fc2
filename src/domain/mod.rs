//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    AppError, ConfigError, ResponseShapeError, StorageError, TransportError, ValidationError,
};
pub use traits::{AccountRepository, ReasoningService, ScreeningPrompt, TransactionStore};
pub use types::{
    Account, DEFAULT_EXCHANGE_RATE_THRESHOLD, DEFAULT_LARGE_TRANSACTION_THRESHOLD,
    EXCHANGE_FEE_RATE, ErrorDetail, ErrorResponse, ExchangeQuote, ExchangeReceipt,
    ExchangeRequest, FlaggedTransaction, HealthResponse, HealthStatus, LedgerEntry,
    SWEEPS_COIN_TO_USD_RATE, ScreeningConfig, ScreeningRequest, ScreeningResult,
    ScreeningRunRequest, ScreeningTransaction, ScreeningTransactionType, ThresholdOverrides,
    Transaction, TransactionKind, TransactionQuery, TransactionStatus, WithdrawalReceipt,
    WithdrawalRequest,
};
