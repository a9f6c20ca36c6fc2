//! Compliance screening and exchange backend for a sweeps coin to USD exchange.
//!
//! Layers:
//! - [`domain`]: types, traits and errors
//! - [`app`]: screening, exchange and query services
//! - [`infra`]: hosted reasoning client and the in-memory ledger
//! - [`api`]: axum router and handlers

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
