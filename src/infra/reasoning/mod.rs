//! Reasoning service providers.

pub mod gemini;

pub use gemini::{
    DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL, GeminiConfig, GeminiReasoningClient,
    offline_screening,
};
