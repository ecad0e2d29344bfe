//! Shared HTTP plumbing: client construction and error classification.

use std::time::Duration;

use propilot_types::ApiError;
use reqwest::header::HeaderMap;

/// Upper bound for a single completion request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Map a transport failure to an ApiError.
pub(crate) fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Parse the `retry-after` header value as seconds and convert to milliseconds.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"error": "text"}` (relay) and `{"error": {"message": "text"}}`
/// (Google APIs); anything else is returned verbatim.
pub(crate) fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| match v.get("error")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => other.get("message")?.as_str().map(str::to_string),
    });
    from_json.unwrap_or_else(|| body.trim().to_string())
}

/// Classify an HTTP error response into a typed ApiError.
pub(crate) fn classify_error(status: u16, body: &str, retry_after: Option<u64>) -> ApiError {
    let message = error_message(body);
    match status {
        401 | 403 => ApiError::Auth { message },
        400 => ApiError::BadRequest { message },
        429 => ApiError::RateLimited {
            retry_after_ms: retry_after,
        },
        _ => ApiError::Server { status, message },
    }
}
