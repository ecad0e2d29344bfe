//! Propilot CLI: chat with an AI assistant whose answers reveal line by line.

mod auth;
mod commands;
mod reveal;

use std::future::Future;
use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use commands::SlashCommand;
use propilot_api::{FirebaseAuth, GeminiClient, RelayClient};
use propilot_config::{Backend, CliOverrides, PropilotConfig};
use propilot_core::{ChatSession, RevealController};
use propilot_terminal::{MarkdownRenderer, PromptResult, RevealPrinter, Spinner, read_line, style};
use propilot_types::{AuthService, AuthState, CompletionService, ConfigError};

#[derive(Parser)]
#[command(name = "propilot", version, about = "Chat with an AI assistant in your terminal")]
struct Cli {
    /// Send a single prompt and print the answer (non-interactive)
    #[arg(short, long)]
    print: Option<String>,

    /// Email address to sign in with
    #[arg(long)]
    email: Option<String>,

    /// Create a new account instead of signing in
    #[arg(long)]
    sign_up: bool,

    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// API key (overrides GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = checked_config(PropilotConfig::load(CliOverrides {
        api_key: cli.api_key,
        model: cli.model,
    }))?;

    let completion = completion_service(&config.backend)?;
    let mut chat = ChatSession::new(completion);

    if let Some(prompt) = cli.print {
        return print_once(&mut chat, &prompt).await;
    }

    let identity: Option<Arc<dyn AuthService>> = match &config.auth {
        Some(settings) => Some(Arc::new(
            FirebaseAuth::new(&settings.api_key, &settings.base_url)
                .context("Failed to create auth client")?,
        )),
        None => None,
    };

    let mut state = AuthState::Anonymous;
    if let Some(service) = &identity {
        match auth::sign_in_interactive(service.as_ref(), cli.email, cli.sign_up).await? {
            Some(session) => state = AuthState::SignedIn(session),
            None => return Ok(()),
        }
    }

    repl(chat, identity, state).await
}

/// Keeps the `ConfigError` as the source so callers can still inspect it.
fn checked_config(loaded: Result<PropilotConfig, ConfigError>) -> Result<PropilotConfig> {
    loaded.context("Failed to load configuration")
}

/// Run `work` to completion, or drop it and return `None` once `interrupt` fires.
async fn until_interrupted<F: Future>(work: F, interrupt: impl Future) -> Option<F::Output> {
    tokio::select! {
        output = work => Some(output),
        _ = interrupt => None,
    }
}

fn completion_service(backend: &Backend) -> Result<Arc<dyn CompletionService>> {
    Ok(match backend {
        Backend::Relay { url } => {
            Arc::new(RelayClient::new(url).context("Failed to create relay client")?)
        }
        Backend::Gemini {
            api_key,
            base_url,
            model,
        } => Arc::new(
            GeminiClient::new(api_key, base_url)
                .context("Failed to create API client")?
                .with_model(model),
        ),
    })
}

/// Print mode: one answer, rendered without animation.
async fn print_once(chat: &mut ChatSession, prompt: &str) -> Result<()> {
    let spinner = Spinner::thinking();
    let id = chat.submit(prompt).await;
    spinner.stop().await;

    let Some(message) = id.and_then(|id| chat.conversation().get(id)) else {
        anyhow::bail!("prompt is empty");
    };
    let mut renderer = MarkdownRenderer::new();
    for line in renderer.render_document(&message.content) {
        println!("{line}");
    }
    Ok(())
}

async fn repl(
    mut chat: ChatSession,
    identity: Option<Arc<dyn AuthService>>,
    mut state: AuthState,
) -> Result<()> {
    let mut controller = RevealController::default();
    let mut printer = RevealPrinter::new(MarkdownRenderer::new());

    eprintln!(
        "propilot v{} (backend: {}{})",
        env!("CARGO_PKG_VERSION"),
        chat.backend_name(),
        match state.user() {
            Some(user) => format!(", signed in as {}", user.email),
            None => String::new(),
        }
    );
    eprintln!("Type your message. /help for commands, Ctrl+D to exit.\n");

    loop {
        if let Some(service) = &identity {
            if !state.is_signed_in() {
                match auth::sign_in_interactive(service.as_ref(), None, false).await? {
                    Some(session) => state = AuthState::SignedIn(session),
                    None => break,
                }
            }
        }

        let input = match read_line("> ").await? {
            PromptResult::Line(line) => line,
            PromptResult::Eof | PromptResult::Interrupted => {
                eprintln!();
                break;
            }
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = SlashCommand::parse(input) {
            match command {
                SlashCommand::Help => commands::print_help(),
                SlashCommand::WhoAmI => match state.user() {
                    Some(user) => eprintln!("Signed in as {} ({})", user.email, user.id),
                    None => eprintln!("Not signed in."),
                },
                SlashCommand::SignIn => match &identity {
                    Some(service) => {
                        if let Some(session) =
                            auth::sign_in_interactive(service.as_ref(), None, false).await?
                        {
                            state = AuthState::SignedIn(session);
                        }
                    }
                    None => eprintln!("Sign-in is not configured (set FIREBASE_API_KEY)."),
                },
                SlashCommand::SignOut => {
                    if state.is_signed_in() {
                        state.sign_out();
                        controller.cancel();
                        chat.clear();
                        eprintln!("Signed out.");
                    } else {
                        eprintln!("Not signed in.");
                    }
                }
                SlashCommand::Clear => {
                    controller.cancel();
                    chat.clear();
                    eprintln!("Conversation cleared.");
                }
                SlashCommand::Quit => break,
                SlashCommand::Unknown(name) => {
                    eprintln!("Unknown command: {name}. Type /help for available commands.");
                }
            }
            continue;
        }

        let spinner = Spinner::thinking();
        let submitted = until_interrupted(chat.submit(input), tokio::signal::ctrl_c()).await;
        spinner.stop().await;

        let Some(submitted) = submitted else {
            tracing::debug!("request cancelled");
            eprintln!("Request cancelled.");
            continue;
        };
        let Some(message) = submitted.and_then(|id| chat.conversation().get(id)) else {
            continue;
        };

        println!("{}", style::assistant_label());
        reveal::reveal_to_terminal(
            &mut controller,
            &mut printer,
            &message.content,
            chat.render_mode(message),
        )
        .await?;
        println!();
    }

    controller.cancel();
    Ok(())
}
