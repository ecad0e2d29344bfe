//! Interactive email and password sign-in.

use std::io;

use propilot_terminal::{PromptResult, read_line, read_secret, style};
use propilot_types::{AuthError, AuthService, AuthSession, validate_sign_up};

/// What the user typed into the sign-in form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Present when creating an account.
    pub confirm: Option<String>,
}

/// Check the form and exchange it for a session.
pub async fn authenticate(
    service: &dyn AuthService,
    credentials: &Credentials,
) -> Result<AuthSession, AuthError> {
    let email = credentials.email.trim();
    match &credentials.confirm {
        Some(confirm) => {
            validate_sign_up(email, &credentials.password, confirm)?;
            service.sign_up(email, &credentials.password).await
        }
        None => {
            if email.is_empty() || credentials.password.is_empty() {
                return Err(AuthError::MissingCredentials);
            }
            service.sign_in(email, &credentials.password).await
        }
    }
}

/// Prompt until sign-in succeeds. Returns `None` if the user gives up with
/// Ctrl+C or Ctrl+D.
pub async fn sign_in_interactive(
    service: &dyn AuthService,
    email: Option<String>,
    sign_up: bool,
) -> io::Result<Option<AuthSession>> {
    let mut email = email;
    let heading = if sign_up { "Create an account" } else { "Sign in" };
    eprintln!("{}", style::bold(heading));

    loop {
        let address = match email.take() {
            Some(address) => {
                eprintln!("Email: {address}");
                address
            }
            None => match read_line("Email: ").await? {
                PromptResult::Line(line) => line,
                PromptResult::Eof | PromptResult::Interrupted => return Ok(None),
            },
        };
        let PromptResult::Line(password) = read_secret("Password: ").await? else {
            return Ok(None);
        };
        let confirm = if sign_up {
            match read_secret("Confirm password: ").await? {
                PromptResult::Line(confirm) => Some(confirm),
                PromptResult::Eof | PromptResult::Interrupted => return Ok(None),
            }
        } else {
            None
        };

        let credentials = Credentials {
            email: address.clone(),
            password,
            confirm,
        };
        match authenticate(service, &credentials).await {
            Ok(session) => return Ok(Some(session)),
            Err(e) => {
                tracing::debug!("authentication failed: {e:?}");
                eprintln!("{}", style::error(&e.to_string()));
                // Keep the address unless it was the problem.
                if !matches!(e, AuthError::MissingCredentials | AuthError::EmailInUse) {
                    email = Some(address);
                }
            }
        }
    }
}
