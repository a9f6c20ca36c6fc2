//! Test utilities: mock collaborators for unit and integration tests.

mod mocks;

pub use mocks::{MockLedger, MockReasoningService, MockReply};
