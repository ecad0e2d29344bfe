//! Terminal style helpers using crossterm ANSI escape sequences.

use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};

/// Wrap text in one attribute, then reset.
fn attr(text: &str, attribute: Attribute) -> String {
    format!(
        "{}{text}{}",
        SetAttribute(attribute),
        SetAttribute(Attribute::Reset)
    )
}

/// Wrap text in a foreground colour, then reset the colour.
pub fn fg_color(text: &str, color: Color) -> String {
    format!(
        "{}{text}{}",
        SetForegroundColor(color),
        SetForegroundColor(Color::Reset)
    )
}

pub fn bold(text: &str) -> String {
    attr(text, Attribute::Bold)
}

pub fn dim(text: &str) -> String {
    attr(text, Attribute::Dim)
}

pub fn italic(text: &str) -> String {
    attr(text, Attribute::Italic)
}

pub fn bold_italic(text: &str) -> String {
    format!("{}{}", SetAttribute(Attribute::Bold), italic(text))
}

/// Inline code span: dim cyan.
pub fn code_span(text: &str) -> String {
    format!(
        "{}{}",
        SetForegroundColor(Color::Cyan),
        attr(text, Attribute::Dim)
    )
}

/// Heading: bold, coloured by level, with the hashes kept as a marker.
pub fn heading(text: &str, level: u8) -> String {
    let color = match level {
        1 => Color::Green,
        2 => Color::Blue,
        3 => Color::Magenta,
        _ => Color::Yellow,
    };
    let marker = "#".repeat(level as usize);
    format!(
        "{}{}",
        SetForegroundColor(color),
        bold(&format!("{marker}  {text}"))
    )
}

/// Link: underlined text followed by the dimmed URL.
pub fn link(text: &str, url: &str) -> String {
    format!("{} ({})", attr(text, Attribute::Underlined), dim(url))
}

/// Horizontal rule, at most 80 columns wide.
pub fn horizontal_rule(width: u16) -> String {
    dim(&"─".repeat(width.min(80) as usize))
}

pub fn blockquote_prefix() -> String {
    dim("│ ")
}

pub fn list_bullet(depth: u8) -> String {
    format!(
        "{}{}",
        "  ".repeat(depth as usize),
        fg_color("•", Color::DarkYellow)
    )
}

pub fn list_number(n: u32, depth: u8) -> String {
    format!(
        "{}{}",
        "  ".repeat(depth as usize),
        fg_color(&format!("{n}."), Color::DarkYellow)
    )
}

/// Dim fence line around a code block, with the language tag if any.
pub fn code_fence(language: &str) -> String {
    dim(&format!("```{language}"))
}

// ---------------------------------------------------------------------------
// Conversation chrome
// ---------------------------------------------------------------------------

/// Speaker label printed above each message.
pub fn speaker(label: &str, color: Color) -> String {
    format!("{}{}", SetForegroundColor(color), bold(label))
}

pub fn user_label() -> String {
    speaker("You", Color::Cyan)
}

pub fn assistant_label() -> String {
    speaker("Propilot", Color::Blue)
}

/// Red error line.
pub fn error(text: &str) -> String {
    fg_color(text, Color::Red)
}
