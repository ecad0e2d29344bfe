//! Busy indicators drawn on stderr while a request or reveal is running.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Animation used by a [`Spinner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerStyle {
    /// Rotating braille glyph, for waiting on the completion service.
    Braille,
    /// Three dots filling in, shown under a message while it reveals.
    Pulse,
}

impl SpinnerStyle {
    fn frames(self) -> &'static [&'static str] {
        match self {
            SpinnerStyle::Braille => &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
            SpinnerStyle::Pulse => &["·  ", "·· ", "···", " ··", "  ·", "   "],
        }
    }

    fn frame_interval(self) -> Duration {
        match self {
            SpinnerStyle::Braille => Duration::from_millis(80),
            SpinnerStyle::Pulse => Duration::from_millis(160),
        }
    }

    /// One rendered frame: glyph, then the message if any.
    fn render(self, index: usize, message: &str) -> String {
        let frames = self.frames();
        let frame = frames[index % frames.len()];
        if message.is_empty() {
            format!("\r  {frame}")
        } else {
            format!("\r  {frame} {message}")
        }
    }
}

/// Where frames go, and whether any should be drawn right now.
struct Canvas {
    active: bool,
    out: Box<dyn Write + Send>,
}

impl Canvas {
    fn clear(&mut self) {
        let _ = write!(self.out, "\r\x1b[2K");
        let _ = self.out.flush();
    }
}

/// A terminal spinner running as a background tokio task.
///
/// Frames are drawn under the same lock `pause()` takes, so once `pause()`
/// returns the line is clear and stays clear until `set_active(true)`.
pub struct Spinner {
    canvas: Arc<Mutex<Canvas>>,
    handle: JoinHandle<()>,
}

impl Spinner {
    /// Start a spinner on stderr with the given style and message.
    pub fn new(style: SpinnerStyle, message: &str) -> Self {
        Self::with_writer(style, message, Box::new(std::io::stderr()))
    }

    /// Start a spinner that draws to `out`.
    pub fn with_writer(style: SpinnerStyle, message: &str, out: Box<dyn Write + Send>) -> Self {
        let canvas = Arc::new(Mutex::new(Canvas { active: true, out }));
        let message = message.to_string();

        let handle = tokio::spawn({
            let canvas = canvas.clone();
            async move {
                let mut index = 0;
                loop {
                    {
                        let mut canvas = canvas.lock().unwrap_or_else(PoisonError::into_inner);
                        if canvas.active {
                            let _ = write!(canvas.out, "{}", style.render(index, &message));
                            let _ = canvas.out.flush();
                            index += 1;
                        }
                    }
                    tokio::time::sleep(style.frame_interval()).await;
                }
            }
        });

        Self { canvas, handle }
    }

    /// "Thinking..." while waiting on an answer.
    pub fn thinking() -> Self {
        Self::new(SpinnerStyle::Braille, "Thinking...")
    }

    /// Three-dot pulse with no message.
    pub fn pulse() -> Self {
        Self::new(SpinnerStyle::Pulse, "")
    }

    fn canvas(&self) -> MutexGuard<'_, Canvas> {
        self.canvas.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_active(&self, active: bool) {
        self.canvas().active = active;
    }

    /// Stop drawing and clear the line. Safe to print once this returns.
    pub fn pause(&self) {
        let mut canvas = self.canvas();
        if canvas.active {
            canvas.active = false;
            canvas.clear();
        }
    }

    /// Stop the spinner, abort the background task, and clear the line.
    pub async fn stop(self) {
        self.canvas().active = false;
        self.handle.abort();
        let Spinner { canvas, handle } = self;
        let _ = handle.await;
        canvas.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
