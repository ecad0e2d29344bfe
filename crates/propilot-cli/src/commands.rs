//! Slash commands understood by the REPL.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    WhoAmI,
    SignIn,
    SignOut,
    Clear,
    Quit,
    Unknown(String),
}

impl SlashCommand {
    /// Parse a line starting with `/`. Anything else is a chat message.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if !input.starts_with('/') {
            return None;
        }
        let cmd = input.split_whitespace().next().unwrap_or(input);
        Some(match cmd {
            "/help" | "/?" => SlashCommand::Help,
            "/whoami" => SlashCommand::WhoAmI,
            "/signin" | "/login" => SlashCommand::SignIn,
            "/signout" | "/logout" => SlashCommand::SignOut,
            "/clear" => SlashCommand::Clear,
            "/quit" | "/exit" => SlashCommand::Quit,
            other => SlashCommand::Unknown(other.to_string()),
        })
    }
}

pub fn print_help() {
    eprintln!("Available commands:");
    eprintln!("  /help     Show this help");
    eprintln!("  /whoami   Show the signed-in user");
    eprintln!("  /signin   Sign in with email and password");
    eprintln!("  /signout  Sign out");
    eprintln!("  /clear    Clear the conversation");
    eprintln!("  /quit     Exit");
    eprintln!();
    eprintln!("Press Ctrl+C while an answer is revealing to show it all at once.");
}
