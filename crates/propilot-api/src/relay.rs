//! Client for a chat relay endpoint speaking `{message}` → `{response}`.

use std::future::Future;
use std::pin::Pin;

use propilot_types::{ApiError, CompletionService};
use serde::{Deserialize, Serialize};

use crate::http::{build_http_client, classify_error, parse_retry_after, transport_error};

/// Posts prompts to a relay that forwards them to the model server-side.
///
/// Success bodies are `{"response": "..."}`; failures carry an error status
/// and `{"error": "..."}`.
#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct RelayResponse {
    response: Option<String>,
}

impl RelayClient {
    pub fn new(url: impl Into<String>) -> Result<Self, ApiError> {
        let http = build_http_client().map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn send(&self, message: &str) -> Result<String, ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::BadRequest {
                message: "Message is required".into(),
            });
        }

        tracing::debug!("POST {}", self.url);

        let response = self
            .http
            .post(&self.url)
            .json(&RelayRequest { message })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body_text = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body_text, retry_after));
        }

        let body = response.text().await.map_err(transport_error)?;
        let parsed: RelayResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))?;
        parsed.response.ok_or(ApiError::EmptyResponse)
    }
}

impl CompletionService for RelayClient {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ApiError>> + Send + 'a>> {
        Box::pin(self.send(prompt))
    }

    fn name(&self) -> &str {
        "relay"
    }
}
