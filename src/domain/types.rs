//! Domain types with validation support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Platform exchange rate: 100 SC = 1 USD
pub const SWEEPS_COIN_TO_USD_RATE: f64 = 0.01;

/// Fee charged on the gross USD amount of an exchange (2%)
pub const EXCHANGE_FEE_RATE: f64 = 0.02;

/// Default amount above which a transaction is considered large
pub const DEFAULT_LARGE_TRANSACTION_THRESHOLD: f64 = 1000.0;

/// Default tolerated deviation of an exchange rate from the norm
pub const DEFAULT_EXCHANGE_RATE_THRESHOLD: f64 = 0.2;

/// Kind of a stored transaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Exchange,
    /// Any kind this service does not recognise
    #[serde(other)]
    Unknown,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Exchange => "exchange",
            Self::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "exchange" => Ok(Self::Exchange),
            _ => Err(format!("Invalid transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement status of a stored transaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
pub enum TransactionStatus {
    Completed,
    #[default]
    Pending,
    Failed,
}

/// Stored transaction record, as kept by the ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier
    #[schema(example = "txn_01")]
    pub id: String,
    /// Transaction kind
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    /// When the transaction happened
    pub date: DateTime<Utc>,
    /// Sweeps coin amount (signed)
    pub amount_coin: f64,
    /// USD amount (signed)
    #[schema(example = 2.0)]
    pub amount_cash: f64,
    /// Account owner
    #[schema(example = "user_42")]
    pub user_id: String,
    /// Rate applied, present for exchanges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 0.01)]
    pub exchange_rate: Option<f64>,
}

impl Transaction {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: TransactionKind,
        user_id: impl Into<String>,
        amount_coin: f64,
        amount_cash: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            status: TransactionStatus::Completed,
            date: Utc::now(),
            amount_coin,
            amount_cash,
            user_id: user_id.into(),
            exchange_rate: None,
        }
    }

    #[must_use]
    pub fn with_exchange_rate(mut self, rate: f64) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }
}

/// Transaction type as understood by the screening service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScreeningTransactionType {
    Deposit,
    Withdrawal,
    Exchange,
}

impl ScreeningTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Exchange => "exchange",
        }
    }
}

impl std::fmt::Display for ScreeningTransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One normalized transaction inside a screening request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningTransaction {
    #[validate(length(min = 1, message = "Transaction ID is required"))]
    pub transaction_id: String,
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,
    pub transaction_type: ScreeningTransactionType,
    /// Non-negative magnitude of the primary amount
    #[validate(range(min = 0.0, message = "Amount must be non-negative"))]
    pub amount: f64,
    /// ISO-8601 timestamp
    #[validate(length(min = 1, message = "Timestamp is required"))]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
}

/// Fully assembled input of one screening call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningRequest {
    #[validate(nested)]
    pub transactions: Vec<ScreeningTransaction>,
    /// Amount above which a transaction is considered large
    #[validate(range(min = 0.0, message = "Large transaction threshold must be non-negative"))]
    #[schema(example = 1000.0)]
    pub large_transaction_threshold: f64,
    /// Tolerated fractional deviation of an exchange rate
    #[validate(range(min = 0.0, message = "Exchange rate threshold must be non-negative"))]
    #[schema(example = 0.2)]
    pub exchange_rate_threshold: f64,
    /// Free-text description of behaviour operators want flagged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unusual_behavior_description: Option<String>,
}

/// A transaction the screening service wants reviewed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedTransaction {
    #[schema(example = "txn_02")]
    pub transaction_id: String,
    #[schema(example = "exceeds large-transaction threshold")]
    pub reason: String,
}

/// Compliance report plus flagged transactions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningResult {
    pub compliance_report: String,
    pub flagged_transactions: Vec<FlaggedTransaction>,
}

/// Default screening configuration passed explicitly into the screener
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningConfig {
    pub large_transaction_threshold: f64,
    pub exchange_rate_threshold: f64,
    pub unusual_behavior_description: Option<String>,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            large_transaction_threshold: DEFAULT_LARGE_TRANSACTION_THRESHOLD,
            exchange_rate_threshold: DEFAULT_EXCHANGE_RATE_THRESHOLD,
            unusual_behavior_description: None,
        }
    }
}

/// Per-invocation overrides of the configured defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdOverrides {
    #[serde(default)]
    pub large_transaction_threshold: Option<f64>,
    #[serde(default)]
    pub exchange_rate_threshold: Option<f64>,
    #[serde(default)]
    pub unusual_behavior_description: Option<String>,
}

/// Body of `POST /compliance/screenings`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningRunRequest {
    /// Transactions to screen; the whole ledger when omitted
    #[serde(default)]
    pub transactions: Option<Vec<Transaction>>,
    #[serde(flatten)]
    pub overrides: ThresholdOverrides,
}

/// Query parameters for the transaction history
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    /// Restrict the history to one account owner
    pub user_id: Option<String>,
}

/// Account balances shown on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[schema(example = "user_42")]
    pub user_id: String,
    #[schema(example = 5000.0)]
    pub sweeps_coins: f64,
    #[schema(example = 12.5)]
    pub usd_balance: f64,
}

impl Account {
    #[must_use]
    pub fn new(user_id: impl Into<String>, sweeps_coins: f64, usd_balance: f64) -> Self {
        Self {
            user_id: user_id.into(),
            sweeps_coins,
            usd_balance,
        }
    }
}

/// Request to quote or execute an exchange
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    /// Sweeps coins to exchange
    #[validate(range(exclusive_min = 0.0, message = "Amount must be greater than 0"))]
    #[schema(example = 1000.0)]
    pub amount_coin: f64,
}

/// Priced exchange of sweeps coins into USD
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeQuote {
    pub amount_coin: f64,
    /// USD before fees
    pub gross_cash: f64,
    pub fee: f64,
    /// USD credited to the account
    pub net_cash: f64,
    pub rate: f64,
    pub fee_rate: f64,
}

/// Outcome of a finalized exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeReceipt {
    pub account: Account,
    pub transaction: Transaction,
    pub quote: ExchangeQuote,
}

/// Request to pay USD out to an external payment method
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    /// USD to withdraw
    #[validate(range(exclusive_min = 0.0, message = "Amount must be greater than 0"))]
    #[schema(example = 25.0)]
    pub amount_cash: f64,
    /// Payout destination, e.g. a PayPal email or bank account
    #[validate(length(min = 1, message = "Payment method is required"))]
    #[schema(example = "payouts@example.com")]
    pub method: String,
}

/// Outcome of an accepted withdrawal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalReceipt {
    pub account: Account,
    /// Recorded `withdrawal` transaction, pending payout
    pub transaction: Transaction,
    pub method: String,
}

/// Balance change that the ledger applies as one unit: the updated account,
/// the fee owed to the house and the transaction describing the move.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub account: Account,
    pub house_fee: f64,
    pub transaction: Transaction,
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Some systems degraded but functional
    Degraded,
    /// Critical systems unavailable
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Ledger health status
    pub ledger: HealthStatus,
    /// Reasoning service health status
    pub reasoning: HealthStatus,
    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    /// The ledger is critical; a failing reasoning service only degrades screening.
    #[must_use]
    pub fn new(ledger: HealthStatus, reasoning: HealthStatus) -> Self {
        let status = match (&ledger, &reasoning) {
            (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
            (HealthStatus::Unhealthy, _) => HealthStatus::Unhealthy,
            _ => HealthStatus::Degraded,
        };
        Self {
            status,
            ledger,
            reasoning,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error type identifier
    #[schema(example = "validation_error")]
    pub r#type: String,
    /// Human-readable error message
    #[schema(example = "Large transaction threshold must be non-negative")]
    pub message: String,
}
