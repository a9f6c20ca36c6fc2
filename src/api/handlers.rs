//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequest, Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, warn};
use utoipa::OpenApi;

use crate::app::{AppState, quote};
use crate::domain::{
    Account, AppError, ErrorDetail, ErrorResponse, ExchangeQuote, ExchangeReceipt,
    ExchangeRequest, FlaggedTransaction, HealthResponse, HealthStatus, ResponseShapeError,
    ScreeningResult, ScreeningRunRequest, StorageError, ThresholdOverrides, Transaction,
    TransactionQuery, TransportError, ValidationError, WithdrawalReceipt, WithdrawalRequest,
};

/// JSON body extractor whose rejections use the API error format
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationError::InvalidField {
            field: "body".to_string(),
            message: rejection.body_text(),
        })
    }
}

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sweeps Compliance API",
        version = "0.1.0",
        description = "Transaction screening, history and exchange for a sweeps coin to USD exchange",
        license(
            name = "MIT"
        )
    ),
    paths(
        screening_handler,
        list_transactions_handler,
        get_transaction_handler,
        get_account_handler,
        quote_exchange_handler,
        execute_exchange_handler,
        withdraw_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
    ),
    components(
        schemas(
            Transaction,
            crate::domain::TransactionKind,
            crate::domain::TransactionStatus,
            ScreeningRunRequest,
            ThresholdOverrides,
            ScreeningResult,
            FlaggedTransaction,
            Account,
            ExchangeRequest,
            ExchangeQuote,
            ExchangeReceipt,
            WithdrawalRequest,
            WithdrawalReceipt,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
            ErrorDetail,
        )
    ),
    tags(
        (name = "compliance", description = "Suspicious-transaction screening"),
        (name = "transactions", description = "Transaction history"),
        (name = "accounts", description = "Balances, exchanges and withdrawals"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Screen transactions for suspicious activity
///
/// Screens the supplied transactions, or every transaction in the ledger
/// when `transactions` is omitted. Unspecified thresholds take the
/// configured defaults.
#[utoipa::path(
    post,
    path = "/compliance/screenings",
    tag = "compliance",
    request_body = ScreeningRunRequest,
    responses(
        (status = 200, description = "Compliance report and flagged transactions", body = ScreeningResult),
        (status = 400, description = "Invalid thresholds or transaction records", body = ErrorResponse),
        (status = 502, description = "Reasoning service failed or replied in the wrong shape", body = ErrorResponse),
        (status = 504, description = "Reasoning service timed out", body = ErrorResponse)
    )
)]
pub async fn screening_handler(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<ScreeningRunRequest>,
) -> Result<Json<ScreeningResult>, AppError> {
    let result = state.service.run_screening(&payload).await?;
    Ok(Json(result))
}

/// List transaction history, newest first
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    params(
        ("userId" = Option<String>, Query, description = "Only transactions of this account owner")
    ),
    responses(
        (status = 200, description = "Transaction history", body = Vec<Transaction>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_transactions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let transactions = state
        .service
        .list_transactions(params.user_id.as_deref())
        .await?;
    Ok(Json(transactions))
}

/// Get a single transaction by ID
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "transactions",
    params(
        ("id" = String, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction found", body = Transaction),
        (status = 404, description = "Transaction not found", body = ErrorResponse)
    )
)]
pub async fn get_transaction_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    let transaction = state.service.get_transaction(&id).await?;
    Ok(Json(transaction))
}

/// Get account balances
#[utoipa::path(
    get,
    path = "/accounts/{user_id}",
    tag = "accounts",
    params(
        ("user_id" = String, Path, description = "Account owner ID")
    ),
    responses(
        (status = 200, description = "Account balances", body = Account),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
pub async fn get_account_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Account>, AppError> {
    let account = state.service.get_account(&user_id).await?;
    Ok(Json(account))
}

/// Quote an exchange of sweeps coins into USD
#[utoipa::path(
    post,
    path = "/exchange/quote",
    tag = "accounts",
    request_body = ExchangeRequest,
    responses(
        (status = 200, description = "Exchange quote", body = ExchangeQuote),
        (status = 400, description = "Invalid amount", body = ErrorResponse)
    )
)]
pub async fn quote_exchange_handler(
    AppJson(payload): AppJson<ExchangeRequest>,
) -> Result<Json<ExchangeQuote>, AppError> {
    Ok(Json(quote(payload.amount_coin)?))
}

/// Finalize an exchange of sweeps coins into USD
///
/// Debits the coins, credits the USD amount net of the 2% fee and records
/// an `exchange` transaction.
#[utoipa::path(
    post,
    path = "/accounts/{user_id}/exchange",
    tag = "accounts",
    params(
        ("user_id" = String, Path, description = "Account owner ID")
    ),
    request_body = ExchangeRequest,
    responses(
        (status = 200, description = "Exchange completed", body = ExchangeReceipt),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 402, description = "Not enough sweeps coins", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
pub async fn execute_exchange_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    AppJson(payload): AppJson<ExchangeRequest>,
) -> Result<Json<ExchangeReceipt>, AppError> {
    let receipt = state.wallet_service.exchange(&user_id, &payload).await?;
    Ok(Json(receipt))
}

/// Request a USD withdrawal to an external payment method
///
/// Debits the USD balance and records a pending `withdrawal` transaction.
#[utoipa::path(
    post,
    path = "/accounts/{user_id}/withdrawals",
    tag = "accounts",
    params(
        ("user_id" = String, Path, description = "Account owner ID")
    ),
    request_body = WithdrawalRequest,
    responses(
        (status = 200, description = "Withdrawal initiated", body = WithdrawalReceipt),
        (status = 400, description = "Invalid amount or payment method", body = ErrorResponse),
        (status = 402, description = "Not enough USD balance", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
pub async fn withdraw_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    AppJson(payload): AppJson<WithdrawalRequest>,
) -> Result<Json<WithdrawalReceipt>, AppError> {
    let receipt = state.wallet_service.withdraw(&user_id, &payload).await?;
    Ok(Json(receipt))
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Application is not ready")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.service.health_check().await;
    match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_type, message) = match &self {
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                self.to_string(),
            ),
            AppError::Transport(transport_err) => match transport_err {
                TransportError::Timeout(_) => {
                    (StatusCode::GATEWAY_TIMEOUT, "timeout", self.to_string())
                }
                TransportError::ApiError {
                    status_code: 429, ..
                } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "rate_limited",
                    self.to_string(),
                ),
                TransportError::Configuration(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    self.to_string(),
                ),
                _ => (
                    StatusCode::BAD_GATEWAY,
                    "transport_error",
                    self.to_string(),
                ),
            },
            AppError::ResponseShape(shape_err) => match shape_err {
                ResponseShapeError::MissingOutput | ResponseShapeError::Malformed(_) => (
                    StatusCode::BAD_GATEWAY,
                    "response_shape_error",
                    self.to_string(),
                ),
            },
            AppError::Storage(storage_err) => match storage_err {
                StorageError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "not_found", self.to_string())
                }
                StorageError::Unavailable(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage_error",
                    self.to_string(),
                ),
                StorageError::Seed(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    self.to_string(),
                ),
            },
            AppError::InsufficientFunds { .. } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_funds",
                self.to_string(),
            ),
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                self.to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                self.to_string(),
            ),
        };

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        } else if status == StatusCode::BAD_REQUEST {
            warn!(message = %message, "Rejected request");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
