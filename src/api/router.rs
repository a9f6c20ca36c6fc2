//! Router configuration and middleware.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;

use super::handlers::{
    ApiDoc, execute_exchange_handler, get_account_handler, get_transaction_handler,
    health_check_handler, list_transactions_handler, liveness_handler, quote_exchange_handler,
    readiness_handler, screening_handler, withdraw_handler,
};

/// Default maximum request body size (1 MiB)
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Create the application router with default limits
pub fn create_router(state: Arc<AppState>) -> Router {
    create_router_with_body_limit(state, DEFAULT_BODY_LIMIT_BYTES)
}

/// Create the application router with a custom request body limit
pub fn create_router_with_body_limit(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/compliance/screenings", post(screening_handler))
        .route("/transactions", get(list_transactions_handler))
        .route("/transactions/{id}", get(get_transaction_handler))
        .route("/accounts/{user_id}", get(get_account_handler))
        .route("/accounts/{user_id}/exchange", post(execute_exchange_handler))
        .route("/accounts/{user_id}/withdrawals", post(withdraw_handler))
        .route("/exchange/quote", post(quote_exchange_handler))
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
