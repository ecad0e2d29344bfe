//! Email/password authentication against the Firebase Identity Toolkit REST API.

use propilot_types::auth::AuthFuture;
use propilot_types::{AuthError, AuthService, AuthSession, AuthUser};
use serde::{Deserialize, Serialize};

use crate::http::{build_http_client, error_message};

/// The default Identity Toolkit base URL.
pub const DEFAULT_AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

/// Identity provider client for a Firebase project.
#[derive(Clone)]
pub struct FirebaseAuth {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    /// Seconds, encoded as a decimal string.
    #[serde(default)]
    expires_in: String,
}

impl FirebaseAuth {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, AuthError> {
        let http = build_http_client().map_err(|e| AuthError::Network(e.to_string()))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn exchange(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let url = format!("{}/v1/accounts:{endpoint}", self.base_url);
        tracing::debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&CredentialsRequest {
                email: email.trim(),
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_auth_error(&error_message(&body)));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| AuthError::Service {
            message: format!("Unexpected identity response: {e}"),
        })?;

        let email = if token.email.is_empty() {
            email.trim().to_string()
        } else {
            token.email
        };

        Ok(AuthSession {
            user: AuthUser {
                id: token.local_id,
                email,
            },
            id_token: token.id_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in.parse().unwrap_or(0),
        })
    }
}

/// Map an Identity Toolkit error code (e.g. `EMAIL_NOT_FOUND`) to an AuthError.
///
/// Codes may carry a detail suffix: `WEAK_PASSWORD : Password should be ...`.
fn classify_auth_error(message: &str) -> AuthError {
    let (code, detail) = match message.split_once(':') {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AuthError::EmailInUse,
        "WEAK_PASSWORD" => AuthError::WeakPassword {
            message: if detail.is_empty() {
                "Password should be at least 6 characters".into()
            } else {
                detail.to_string()
            },
        },
        _ => AuthError::Service {
            message: message.to_string(),
        },
    }
}

impl AuthService for FirebaseAuth {
    fn sign_in<'a>(&'a self, email: &'a str, password: &'a str) -> AuthFuture<'a> {
        Box::pin(self.exchange("signInWithPassword", email, password))
    }

    fn sign_up<'a>(&'a self, email: &'a str, password: &'a str) -> AuthFuture<'a> {
        Box::pin(self.exchange("signUp", email, password))
    }
}
