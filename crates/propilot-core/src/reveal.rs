//! Line-by-line reveal state machine.
//!
//! Pure and timer-free: a driver calls [`RevealState::tick`] at its cadence and
//! reads [`RevealState::view`] after each step. See `controller` for the
//! tokio-driven driver.

/// How a message is presented.
///
/// Only the latest assistant message animates; everything else renders
/// statically through the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Animated,
    Static,
}

impl RenderMode {
    pub fn for_message(is_latest: bool) -> Self {
        if is_latest {
            RenderMode::Animated
        } else {
            RenderMode::Static
        }
    }
}

/// Lifecycle of a reveal for one source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    Idle,
    Revealing,
    Complete,
}

/// Snapshot consumed by the rendering layer on every tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealView {
    /// The lines revealed so far, in order.
    pub lines: Vec<String>,
    /// True until the reveal is complete; drives the pulse indicator.
    pub busy: bool,
}

impl RevealView {
    /// Currently visible text: revealed lines joined by newline.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

/// Reveal progress over one immutable source text.
#[derive(Debug, Clone)]
pub struct RevealState {
    source: String,
    lines: Vec<String>,
    revealed: usize,
    phase: RevealPhase,
}

/// Split on `\n`, keeping empty lines. An empty source has zero lines.
fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(str::to_string).collect()
}

impl RevealState {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let lines = split_lines(&source);
        Self {
            source,
            lines,
            revealed: 0,
            phase: RevealPhase::Idle,
        }
    }

    /// First observation: leave `Idle` according to the render mode.
    ///
    /// Static mode and empty sources complete immediately with everything
    /// visible. Calling `start` outside `Idle` does nothing.
    pub fn start(&mut self, mode: RenderMode) -> RevealPhase {
        if self.phase != RevealPhase::Idle {
            return self.phase;
        }
        if mode == RenderMode::Static || self.lines.is_empty() {
            self.revealed = self.lines.len();
            self.phase = RevealPhase::Complete;
        } else {
            self.phase = RevealPhase::Revealing;
        }
        self.phase
    }

    /// Reveal the next line. Returns `true` if the reveal advanced.
    pub fn tick(&mut self) -> bool {
        if self.phase != RevealPhase::Revealing {
            return false;
        }
        self.revealed += 1;
        if self.revealed == self.lines.len() {
            self.phase = RevealPhase::Complete;
        }
        true
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == RevealPhase::Complete
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn visible_lines(&self) -> &[String] {
        &self.lines[..self.revealed]
    }

    pub fn view(&self) -> RevealView {
        RevealView {
            lines: self.visible_lines().to_vec(),
            busy: !self.is_complete(),
        }
    }
}
