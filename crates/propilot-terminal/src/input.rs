//! Prompted input for credentials: plain lines and hidden passwords.

use std::future::Future;
use std::io::{self, BufRead, Write};
use std::sync::{LazyLock, Mutex, PoisonError, mpsc};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::sync::oneshot;

/// Outcome of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    Line(String),
    /// Ctrl+D on an empty entry, or end of input.
    Eof,
    /// Ctrl+C.
    Interrupted,
}

/// RAII guard that disables raw mode on drop.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// What a keypress does to a hidden entry.
#[derive(Debug, PartialEq, Eq)]
enum SecretKey {
    Push(char),
    Pop,
    Submit,
    Eof,
    Interrupt,
    Ignore,
}

fn map_secret_key(key: KeyEvent) -> SecretKey {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => SecretKey::Interrupt,
        KeyCode::Char('d') if ctrl => SecretKey::Eof,
        KeyCode::Char('h') if ctrl => SecretKey::Pop,
        KeyCode::Char(_) if ctrl => SecretKey::Ignore,
        KeyCode::Char(c) => SecretKey::Push(c),
        KeyCode::Backspace => SecretKey::Pop,
        KeyCode::Enter => SecretKey::Submit,
        _ => SecretKey::Ignore,
    }
}

/// Apply one key to the entry. Returns a result once the entry is finished.
fn apply_secret_key(entry: &mut String, key: SecretKey) -> Option<PromptResult> {
    match key {
        SecretKey::Push(c) => entry.push(c),
        SecretKey::Pop => {
            entry.pop();
        }
        SecretKey::Submit => return Some(PromptResult::Line(std::mem::take(entry))),
        SecretKey::Eof if entry.is_empty() => return Some(PromptResult::Eof),
        SecretKey::Interrupt => return Some(PromptResult::Interrupted),
        SecretKey::Eof | SecretKey::Ignore => {}
    }
    None
}

fn read_secret_sync(prompt: &str) -> io::Result<PromptResult> {
    let mut err = io::stderr();
    write!(err, "{prompt}")?;
    err.flush()?;

    let result = {
        let _guard = RawModeGuard::enable()?;
        let mut entry = String::new();
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            // crossterm sends Release/Repeat events on some platforms
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(result) = apply_secret_key(&mut entry, map_secret_key(key)) {
                break result;
            }
        }
    };

    writeln!(err)?;
    Ok(result)
}

/// Read a password without echoing it.
pub async fn read_secret(prompt: &str) -> io::Result<PromptResult> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || read_secret_sync(&prompt))
        .await
        .map_err(io::Error::other)?
}

type LineResult = io::Result<Option<String>>;

/// Reads stdin on a dedicated thread, one line per request.
///
/// A read abandoned by Ctrl+C stays parked in `pending` and is picked up by
/// the next prompt, so no typed line is lost and no runtime thread is left
/// blocked on stdin.
struct LineReader {
    requests: mpsc::Sender<oneshot::Sender<LineResult>>,
    pending: Mutex<Option<oneshot::Receiver<LineResult>>>,
}

static STDIN_LINES: LazyLock<LineReader> = LazyLock::new(|| {
    let (requests, rx) = mpsc::channel::<oneshot::Sender<LineResult>>();
    let spawned = std::thread::Builder::new()
        .name("propilot-stdin".into())
        .spawn(move || {
            for reply in rx {
                let mut line = String::new();
                let result = match io::stdin().lock().read_line(&mut line) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(line)),
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
        });
    if let Err(e) = spawned {
        tracing::error!("failed to start stdin reader: {e}");
    }
    LineReader {
        requests,
        pending: Mutex::new(None),
    }
});

fn reader_gone() -> io::Error {
    io::Error::other("stdin reader stopped")
}

/// Wait for a requested line, or for `interrupt` to fire first.
async fn wait_for_line(
    reply: &mut oneshot::Receiver<LineResult>,
    interrupt: impl Future,
) -> io::Result<PromptResult> {
    tokio::select! {
        line = reply => match line.map_err(|_| reader_gone())?? {
            Some(line) => Ok(PromptResult::Line(
                line.trim_end_matches(['\r', '\n']).to_string(),
            )),
            None => Ok(PromptResult::Eof),
        },
        _ = interrupt => Ok(PromptResult::Interrupted),
    }
}

/// Read one echoed line from stdin. Ctrl+C yields `Interrupted`.
pub async fn read_line(prompt: &str) -> io::Result<PromptResult> {
    let mut err = io::stderr();
    write!(err, "{prompt}")?;
    err.flush()?;

    let reader = &*STDIN_LINES;
    let pending = reader
        .pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    let mut reply = match pending {
        Some(reply) => reply,
        None => {
            let (tx, rx) = oneshot::channel();
            reader.requests.send(tx).map_err(|_| reader_gone())?;
            rx
        }
    };

    let result = wait_for_line(&mut reply, tokio::signal::ctrl_c()).await;
    if let Ok(PromptResult::Interrupted) = result {
        writeln!(err)?;
        *reader.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(reply);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_keys(keys: &[KeyEvent]) -> Option<PromptResult> {
        let mut entry = String::new();
        keys.iter()
            .find_map(|&k| apply_secret_key(&mut entry, map_secret_key(k)))
    }

    #[test]
    fn key_mapping() {
        assert_eq!(map_secret_key(key(KeyCode::Char('x'))), SecretKey::Push('x'));
        assert_eq!(map_secret_key(key(KeyCode::Backspace)), SecretKey::Pop);
        assert_eq!(map_secret_key(ctrl('h')), SecretKey::Pop);
        assert_eq!(map_secret_key(key(KeyCode::Enter)), SecretKey::Submit);
        assert_eq!(map_secret_key(ctrl('c')), SecretKey::Interrupt);
        assert_eq!(map_secret_key(ctrl('d')), SecretKey::Eof);
        assert_eq!(map_secret_key(ctrl('a')), SecretKey::Ignore);
        assert_eq!(map_secret_key(key(KeyCode::Left)), SecretKey::Ignore);
    }

    #[test]
    fn typed_password_submits() {
        let result = type_keys(&[
            key(KeyCode::Char('p')),
            key(KeyCode::Char('w')),
            key(KeyCode::Char('x')),
            key(KeyCode::Backspace),
            key(KeyCode::Char('d')),
            key(KeyCode::Enter),
        ]);
        assert_eq!(result, Some(PromptResult::Line("pwd".into())));
    }

    #[test]
    fn ctrl_d_only_ends_empty_entry() {
        assert_eq!(type_keys(&[ctrl('d')]), Some(PromptResult::Eof));
        assert_eq!(type_keys(&[key(KeyCode::Char('a')), ctrl('d')]), None);
    }

    #[test]
    fn ctrl_c_interrupts() {
        assert_eq!(
            type_keys(&[key(KeyCode::Char('a')), ctrl('c')]),
            Some(PromptResult::Interrupted)
        );
    }

    #[tokio::test]
    async fn interrupt_keeps_the_pending_line() {
        let (tx, mut rx) = oneshot::channel();
        let first = wait_for_line(&mut rx, std::future::ready(())).await.unwrap();
        assert_eq!(first, PromptResult::Interrupted);

        tx.send(Ok(Some("hello\r\n".into()))).unwrap();
        let second = wait_for_line(&mut rx, std::future::pending::<()>())
            .await
            .unwrap();
        assert_eq!(second, PromptResult::Line("hello".into()));
    }

    #[tokio::test]
    async fn end_of_input_is_eof() {
        let (tx, mut rx) = oneshot::channel();
        tx.send(Ok(None)).unwrap();
        let result = wait_for_line(&mut rx, std::future::pending::<()>())
            .await
            .unwrap();
        assert_eq!(result, PromptResult::Eof);
    }

    #[tokio::test]
    async fn vanished_reader_is_an_error() {
        let (tx, mut rx) = oneshot::channel::<LineResult>();
        drop(tx);
        assert!(
            wait_for_line(&mut rx, std::future::pending::<()>())
                .await
                .is_err()
        );
    }

    #[test]
    fn backspace_on_empty_is_harmless() {
        assert_eq!(
            type_keys(&[key(KeyCode::Backspace), key(KeyCode::Enter)]),
            Some(PromptResult::Line(String::new()))
        );
    }
}
