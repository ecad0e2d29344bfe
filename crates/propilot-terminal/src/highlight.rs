//! Fenced code block highlighting via syntect.

use std::fmt::Write;
use std::sync::LazyLock;

use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

/// Theme used for every code block.
const THEME_NAME: &str = "base16-ocean.dark";

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

static THEME: LazyLock<Theme> = LazyLock::new(|| {
    let mut themes = ThemeSet::load_defaults();
    themes.themes.remove(THEME_NAME).unwrap_or_default()
});

/// Highlights the lines of one code block at a time.
///
/// Parser state carries across lines, so multi-line constructs (block
/// comments, strings) colour correctly while a block is open.
#[derive(Default)]
pub struct CodeHighlighter {
    block: Option<HighlightLines<'static>>,
}

impl CodeHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a block for the fence's language tag ("rust", "py", "js", ...).
    /// Unknown or empty tags highlight as plain text.
    pub fn start_block(&mut self, language: &str) {
        let syntax = SYNTAXES
            .find_syntax_by_token(language)
            .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text());
        self.block = Some(HighlightLines::new(syntax, &THEME));
    }

    /// Highlight one line of the open block.
    ///
    /// Outside a block the line comes back dimmed.
    pub fn highlight_line(&mut self, line: &str) -> String {
        let Some(block) = self.block.as_mut() else {
            return format!(
                "{}{line}{}",
                SetAttribute(Attribute::Dim),
                SetAttribute(Attribute::Reset)
            );
        };

        let line = format!("{}\n", line.trim_end_matches('\n'));
        match block.highlight_line(&line, &SYNTAXES) {
            Ok(ranges) => ranges_to_ansi(&ranges),
            Err(e) => {
                tracing::debug!("highlighting failed: {e}");
                line.trim_end_matches('\n').to_string()
            }
        }
    }

    pub fn end_block(&mut self) {
        self.block = None;
    }

    pub fn is_active(&self) -> bool {
        self.block.is_some()
    }
}

/// Convert syntect ranges to truecolor ANSI sequences.
fn ranges_to_ansi(ranges: &[(Style, &str)]) -> String {
    let mut out = String::new();
    for (style, text) in ranges {
        let text = text.trim_end_matches('\n');
        if text.is_empty() {
            continue;
        }

        let fg = style.foreground;
        let _ = write!(
            out,
            "{}",
            SetForegroundColor(Color::Rgb {
                r: fg.r,
                g: fg.g,
                b: fg.b,
            })
        );
        for (flag, attr) in [
            (FontStyle::BOLD, Attribute::Bold),
            (FontStyle::ITALIC, Attribute::Italic),
            (FontStyle::UNDERLINE, Attribute::Underlined),
        ] {
            if style.font_style.contains(flag) {
                let _ = write!(out, "{}", SetAttribute(attr));
            }
        }
        let _ = write!(out, "{text}{}", SetAttribute(Attribute::Reset));
    }
    out
}
