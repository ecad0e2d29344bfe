//! Line-oriented markdown renderer for terminal output.
//!
//! Lines are rendered one at a time, in order, as the reveal uncovers them.
//! The only context carried between lines is whether a fenced code block is
//! open, so its lines get syntax highlighting for the fence's language.

use crossterm::terminal;

use crate::highlight::CodeHighlighter;
use crate::style;

/// What a blank line renders as, so it still occupies a row.
pub const BLANK_LINE: &str = " ";

/// Block-level meaning of one line.
#[derive(Debug, PartialEq, Eq)]
enum Block<'a> {
    /// Opening or closing ``` fence, with the language tag.
    Fence(&'a str),
    Code(&'a str),
    Heading { level: u8, text: &'a str },
    Rule,
    Quote(&'a str),
    Bullet { depth: u8, text: &'a str },
    Numbered { depth: u8, number: u32, text: &'a str },
    Blank,
    Paragraph(&'a str),
}

fn classify(line: &str, in_code: bool) -> Block<'_> {
    let trimmed = line.trim();

    if let Some(tag) = trimmed.strip_prefix("```") {
        return Block::Fence(tag.trim_start_matches('`').trim());
    }
    if in_code {
        return Block::Code(line);
    }
    if trimmed.is_empty() {
        return Block::Blank;
    }
    if let Some((level, text)) = heading(trimmed) {
        return Block::Heading { level, text };
    }
    if is_rule(trimmed) {
        return Block::Rule;
    }
    if trimmed == ">" {
        return Block::Quote("");
    }
    if let Some(text) = trimmed.strip_prefix("> ") {
        return Block::Quote(text);
    }

    let indent = line.len() - line.trim_start_matches(' ').len();
    let depth = (indent / 2) as u8;
    let rest = &line[indent..];
    if let Some(text) = rest.strip_prefix("- ").or_else(|| rest.strip_prefix("* ")) {
        return Block::Bullet { depth, text };
    }
    if let Some((number, text)) = numbered(rest) {
        return Block::Numbered {
            depth,
            number,
            text,
        };
    }
    Block::Paragraph(trimmed)
}

/// `# Title` through `###### Title`. The hashes must be followed by a space.
fn heading(line: &str) -> Option<(u8, &str)> {
    let level = line.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some((level as u8, rest.trim()))
}

/// Three or more of the same `-`, `*`, or `_`, spaces allowed between.
fn is_rule(line: &str) -> bool {
    let mut marks = line.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

/// `12. text` → (12, "text").
fn numbered(line: &str) -> Option<(u32, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let text = line[digits..].strip_prefix(". ")?;
    let number = line[..digits].parse().ok()?;
    Some((number, text))
}

/// Renders markdown text line by line into styled terminal strings.
pub struct MarkdownRenderer {
    highlighter: CodeHighlighter,
    in_code: bool,
    term_width: u16,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a renderer sized to the current terminal.
    pub fn new() -> Self {
        let (width, _) = terminal::size().unwrap_or((80, 24));
        Self::with_width(width)
    }

    pub fn with_width(term_width: u16) -> Self {
        Self {
            highlighter: CodeHighlighter::new(),
            in_code: false,
            term_width,
        }
    }

    /// Whether a fenced code block is currently open.
    pub fn in_code_block(&self) -> bool {
        self.in_code
    }

    /// Forget any open code block before rendering a new message.
    pub fn reset(&mut self) {
        self.in_code = false;
        self.highlighter.end_block();
    }

    /// Render one line. Blank lines come back as [`BLANK_LINE`].
    pub fn render_line(&mut self, line: &str) -> String {
        match classify(line, self.in_code) {
            Block::Fence(tag) => {
                if self.in_code {
                    self.reset();
                    style::code_fence("")
                } else {
                    self.in_code = true;
                    self.highlighter.start_block(tag);
                    style::code_fence(tag)
                }
            }
            Block::Code(code) => format!("  {}", self.highlighter.highlight_line(code)),
            Block::Heading { level, text } => style::heading(&render_inline(text), level),
            Block::Rule => style::horizontal_rule(self.term_width),
            Block::Quote(text) => format!("{}{}", style::blockquote_prefix(), render_inline(text)),
            Block::Bullet { depth, text } => {
                format!("{} {}", style::list_bullet(depth), render_inline(text))
            }
            Block::Numbered {
                depth,
                number,
                text,
            } => format!("{} {}", style::list_number(number, depth), render_inline(text)),
            Block::Blank => BLANK_LINE.to_string(),
            Block::Paragraph(text) => render_inline(text),
        }
    }

    /// Render a complete message in one pass. An empty text has no lines.
    pub fn render_document(&mut self, text: &str) -> Vec<String> {
        self.reset();
        if text.is_empty() {
            return Vec::new();
        }
        let rendered = text.split('\n').map(|line| self.render_line(line)).collect();
        self.reset();
        rendered
    }
}

// ---------------------------------------------------------------------------
// Inline markdown
// ---------------------------------------------------------------------------

/// Characters a backslash can escape.
const ESCAPABLE: &[char] = &['*', '`', '[', ']', '(', ')', '\\', '_'];

/// Render inline markdown: `***both***`, `**bold**`, `*italic*`, `` `code` ``,
/// `[text](url)`, and backslash escapes. Unclosed markers stay literal.
pub fn render_inline(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' {
            if let Some(&next) = chars.get(i + 1) {
                if ESCAPABLE.contains(&next) {
                    out.push(next);
                    i += 2;
                    continue;
                }
            }
        }

        if c == '*' {
            let run = chars[i..].iter().take(3).take_while(|&&ch| ch == '*').count();
            if let Some((inner, next)) = emphasis(&chars, i, run) {
                let styled = match run {
                    3 => style::bold_italic(&inner),
                    2 => style::bold(&inner),
                    _ => style::italic(&inner),
                };
                out.push_str(&styled);
                i = next;
                continue;
            }
        }

        if c == '`' {
            if let Some(end) = position(&chars, i + 1, |ch| ch == '`') {
                let inner: String = chars[i + 1..end].iter().collect();
                out.push_str(&style::code_span(&inner));
                i = end + 1;
                continue;
            }
        }

        if c == '[' {
            if let Some((label, url, next)) = link(&chars, i) {
                out.push_str(&style::link(&label, &url));
                i = next;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Try emphasis with a `*` run of length `run` starting at `start`, falling
/// back to shorter runs. Returns the inner text and the index after the
/// closing marker.
fn emphasis(chars: &[char], start: usize, run: usize) -> Option<(String, usize)> {
    (1..=run).rev().find_map(|width| {
        let open_end = start + width;
        let marker = &chars[start..open_end];
        let close = (open_end..=chars.len().saturating_sub(width))
            .find(|&j| j > open_end && chars[j..j + width] == *marker)?;
        let inner: String = chars[open_end..close].iter().collect();
        Some((inner, close + width))
    })
}

fn position(chars: &[char], from: usize, pred: impl Fn(char) -> bool) -> Option<usize> {
    (from..chars.len()).find(|&j| pred(chars[j]))
}

/// `[label](url)` starting at `start`. Returns label, url, and the index
/// after the closing paren.
fn link(chars: &[char], start: usize) -> Option<(String, String, usize)> {
    let close_bracket = position(chars, start + 1, |c| c == ']')?;
    if chars.get(close_bracket + 1) != Some(&'(') {
        return None;
    }
    let close_paren = position(chars, close_bracket + 2, |c| c == ')')?;
    let label = chars[start + 1..close_bracket].iter().collect();
    let url = chars[close_bracket + 2..close_paren].iter().collect();
    Some((label, url, close_paren + 1))
}
