//! Error types for the application.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Response shape error: {0}")]
    ResponseShape(#[from] ResponseShapeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: f64, available: f64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Request or input validation failures
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("{0}")]
    Multiple(String),
}

/// Failures reaching the external reasoning service
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API returned {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Client configuration error: {0}")]
    Configuration(String),
}

/// The reasoning service replied, but not in the declared output shape
#[derive(Debug, Error)]
pub enum ResponseShapeError {
    #[error("Service returned no structured output")]
    MissingOutput,

    #[error("Malformed output: {0}")]
    Malformed(String),
}

/// Transaction store / account repository failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid seed data: {0}")]
    Seed(String),
}

/// Startup configuration failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(ValidationError::Multiple(errors.to_string()))
    }
}
