//! Identity provider trait and signed-in state.

use crate::AuthError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// A verified user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Tokens issued by the identity provider for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: AuthUser,
    pub id_token: String,
    pub refresh_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Whether the current terminal session has a signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    SignedIn(AuthSession),
}

impl AuthState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthState::Anonymous => None,
            AuthState::SignedIn(session) => Some(&session.user),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn(_))
    }

    /// Drop the session tokens and return to anonymous.
    pub fn sign_out(&mut self) {
        *self = AuthState::Anonymous;
    }
}

/// Boxed future returned by [`AuthService`] calls.
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<AuthSession, AuthError>> + Send + 'a>>;

/// Verifies identity with email and password credentials.
pub trait AuthService: Send + Sync {
    fn sign_in<'a>(&'a self, email: &'a str, password: &'a str) -> AuthFuture<'a>;

    fn sign_up<'a>(&'a self, email: &'a str, password: &'a str) -> AuthFuture<'a>;
}

/// Check a sign-up form before it reaches the identity provider.
pub fn validate_sign_up(email: &str, password: &str, confirm: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AuthSession {
        AuthSession {
            user: AuthUser {
                id: "uid-1".into(),
                email: "ada@example.com".into(),
            },
            id_token: "id".into(),
            refresh_token: "refresh".into(),
            expires_in: 3600,
        }
    }

    #[test]
    fn default_state_is_anonymous() {
        let state = AuthState::default();
        assert!(!state.is_signed_in());
        assert!(state.user().is_none());
    }

    #[test]
    fn sign_out_returns_to_anonymous() {
        let mut state = AuthState::SignedIn(session());
        assert_eq!(state.user().map(|u| u.email.as_str()), Some("ada@example.com"));
        state.sign_out();
        assert_eq!(state, AuthState::Anonymous);
    }

    #[test]
    fn sign_up_rejects_mismatched_passwords() {
        assert_eq!(
            validate_sign_up("a@b.c", "hunter22", "hunter23"),
            Err(AuthError::PasswordMismatch)
        );
    }

    #[test]
    fn sign_up_requires_credentials() {
        assert_eq!(
            validate_sign_up("  ", "pw", "pw"),
            Err(AuthError::MissingCredentials)
        );
        assert_eq!(
            validate_sign_up("a@b.c", "", ""),
            Err(AuthError::MissingCredentials)
        );
    }

    #[test]
    fn sign_up_accepts_matching_passwords() {
        assert!(validate_sign_up("a@b.c", "hunter22", "hunter22").is_ok());
    }

    #[test]
    fn auth_service_is_dyn_compatible() {
        fn _accept(_s: &dyn AuthService) {}
    }
}
