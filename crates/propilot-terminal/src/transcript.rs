//! Turns successive reveal snapshots into newly printable terminal lines.

use crate::markdown::MarkdownRenderer;

/// Tracks how much of a message has been printed.
///
/// Each snapshot holds every revealed line so far; only lines past the ones
/// already printed are rendered. A snapshot shorter than what was printed
/// means a new message started, and printing starts over.
pub struct RevealPrinter {
    renderer: MarkdownRenderer,
    printed: usize,
}

impl RevealPrinter {
    pub fn new(renderer: MarkdownRenderer) -> Self {
        Self {
            renderer,
            printed: 0,
        }
    }

    /// Number of lines printed for the current message.
    pub fn printed(&self) -> usize {
        self.printed
    }

    /// Start a new message.
    pub fn reset(&mut self) {
        self.renderer.reset();
        self.printed = 0;
    }

    /// Render the lines of `revealed` not yet printed.
    pub fn advance(&mut self, revealed: &[String]) -> Vec<String> {
        if revealed.len() < self.printed {
            self.reset();
        }
        let fresh: Vec<String> = revealed[self.printed..]
            .iter()
            .map(|line| self.renderer.render_line(line))
            .collect();
        self.printed = revealed.len();
        fresh
    }
}
