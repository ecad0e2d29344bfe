//! Shared data model, collaborator traits, and error hierarchy for Propilot.

pub mod auth;
pub mod completion;
pub mod error;
pub mod message;

pub use auth::{AuthService, AuthSession, AuthState, AuthUser, validate_sign_up};
pub use completion::CompletionService;
pub use error::{ApiError, AuthError, ConfigError};
pub use message::*;
