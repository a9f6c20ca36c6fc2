//! Infrastructure layer implementations.

pub mod ledger;
pub mod reasoning;

pub use ledger::{InMemoryLedger, LedgerSeed};
pub use reasoning::{GeminiConfig, GeminiReasoningClient};
