//! Application layer containing business logic and shared state.

pub mod normalizer;
pub mod prompt;
pub mod screening_service;
pub mod service;
pub mod state;
pub mod wallet_service;

pub use normalizer::{normalize_transaction, normalize_transactions};
pub use prompt::{output_schema, render_prompt};
pub use screening_service::{ComplianceScreener, parse_result, validate_request};
pub use service::AppService;
pub use state::AppState;
pub use wallet_service::{WalletService, quote};
