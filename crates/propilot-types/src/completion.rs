//! Completion service trait.

use crate::ApiError;
use std::future::Future;
use std::pin::Pin;

/// Turns a prompt into one finished text response.
///
/// The response arrives complete; there is no partial or streamed data.
/// Dyn-compatible so the chat session works with `Arc<dyn CompletionService>`.
pub trait CompletionService: Send + Sync {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ApiError>> + Send + 'a>>;

    /// Backend name for logging/display (e.g., "gemini").
    fn name(&self) -> &str;
}
