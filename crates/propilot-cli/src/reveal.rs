//! Draws a reveal on the terminal as the controller publishes it.

use std::io::{self, Write};

use propilot_core::{RenderMode, RevealController};
use propilot_terminal::{RevealPrinter, Spinner};

/// Reveal `text` on stdout and return once every line is printed.
///
/// A pulse shows below the last line while more lines are pending. Ctrl+C
/// skips the animation and prints the rest at once.
pub async fn reveal_to_terminal(
    controller: &mut RevealController,
    printer: &mut RevealPrinter,
    text: &str,
    mode: RenderMode,
) -> io::Result<()> {
    let mut rx = controller.subscribe();
    printer.reset();
    controller.show(text, mode);

    let pulse = Spinner::pulse();
    pulse.pause();
    let mut skipped = false;

    let result = loop {
        let view = rx.borrow_and_update().clone();
        let fresh = printer.advance(&view.lines);
        if !fresh.is_empty() {
            pulse.pause();
            if let Err(e) = print_lines(&fresh) {
                break Err(e);
            }
        }
        if !view.is_busy() {
            break Ok(());
        }
        pulse.set_active(true);

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
            }
            _ = tokio::signal::ctrl_c(), if !skipped => {
                tracing::debug!("reveal skipped");
                skipped = true;
                controller.show(text, RenderMode::Static);
            }
        }
    };

    pulse.stop().await;
    result
}

fn print_lines(lines: &[String]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}
