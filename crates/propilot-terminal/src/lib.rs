//! Terminal rendering and input for Propilot.

pub mod highlight;
pub mod input;
pub mod markdown;
pub mod spinner;
pub mod style;
mod transcript;

pub use input::{PromptResult, read_line, read_secret};
pub use markdown::MarkdownRenderer;
pub use spinner::{Spinner, SpinnerStyle};
pub use transcript::RevealPrinter;
