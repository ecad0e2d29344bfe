//! Progressive reveal controller and chat session for Propilot.

mod chat;
mod controller;
pub mod reveal;

pub use chat::{APOLOGY, ChatSession};
pub use controller::{REVEAL_INTERVAL, RevealController};
pub use reveal::{RenderMode, RevealPhase, RevealState, RevealView};
