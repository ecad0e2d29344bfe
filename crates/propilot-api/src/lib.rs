//! Completion service and identity provider clients for Propilot.

mod auth;
mod client;
mod http;
mod relay;

pub use auth::{DEFAULT_AUTH_BASE_URL, FirebaseAuth};
pub use client::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, GeminiClient};
pub use relay::RelayClient;
