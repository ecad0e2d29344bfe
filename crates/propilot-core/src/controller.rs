//! Timer-driven reveal controller.
//!
//! Owns at most one repeating tick task for the message slot it renders.
//! Views are published through a `watch` channel so a renderer can redraw
//! on every tick.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::reveal::{RenderMode, RevealPhase, RevealState, RevealView};

/// Cadence at which the latest assistant message gains one line.
pub const REVEAL_INTERVAL: Duration = Duration::from_millis(400);

struct Slot {
    /// Bumped on every cancel. A tick only applies if it still matches.
    generation: u64,
    state: RevealState,
    mode: RenderMode,
}

struct Shared {
    slot: Mutex<Slot>,
    tx: watch::Sender<RevealView>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ActiveTimer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Reveals one message at a time, line by line, at a fixed cadence.
///
/// `show` must be called from within a tokio runtime. Dropping the
/// controller cancels any pending timer.
pub struct RevealController {
    interval: Duration,
    shared: Arc<Shared>,
    timer: Option<ActiveTimer>,
}

impl Default for RevealController {
    fn default() -> Self {
        Self::new(REVEAL_INTERVAL)
    }
}

impl RevealController {
    /// Create an idle controller.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn new(interval: Duration) -> Self {
        assert!(!interval.is_zero(), "reveal interval must be non-zero");
        let (tx, _rx) = watch::channel(RevealView::default());
        Self {
            interval,
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    generation: 0,
                    state: RevealState::new(""),
                    mode: RenderMode::Static,
                }),
                tx,
            }),
            timer: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Present `text` in the given mode.
    ///
    /// Showing the same text and mode again while it is revealing or after it
    /// completed is a no-op. Anything else cancels the current reveal and
    /// starts over from zero lines.
    pub fn show(&mut self, text: &str, mode: RenderMode) {
        {
            let slot = self.shared.lock();
            let same = slot.state.source() == text && slot.mode == mode;
            if same && (slot.state.is_complete() || self.is_running()) {
                return;
            }
        }

        self.cancel();

        let generation = {
            let mut slot = self.shared.lock();
            slot.state = RevealState::new(text);
            slot.mode = mode;
            let phase = slot.state.start(mode);
            self.shared.tx.send_replace(slot.state.view());
            tracing::debug!(
                "reveal started: {} lines, {mode:?}, {phase:?}",
                slot.state.line_count()
            );
            if phase != RevealPhase::Revealing {
                return;
            }
            slot.generation
        };

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_timer(
            Arc::clone(&self.shared),
            generation,
            Instant::now() + self.interval,
            self.interval,
            cancel.clone(),
        ));
        self.timer = Some(ActiveTimer { cancel, handle });
    }

    /// Stop the pending timer. The current view stays frozen where it is.
    pub fn cancel(&mut self) {
        self.shared.lock().generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.cancel.cancel();
            timer.handle.abort();
            tracing::debug!("reveal timer cancelled");
        }
    }

    /// Whether a tick task is still pending.
    pub fn is_running(&self) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|timer| !timer.handle.is_finished())
    }

    /// The current snapshot.
    pub fn view(&self) -> RevealView {
        self.shared.tx.borrow().clone()
    }

    pub fn phase(&self) -> RevealPhase {
        self.shared.lock().state.phase()
    }

    /// Receive a new view after every tick.
    pub fn subscribe(&self) -> watch::Receiver<RevealView> {
        self.shared.tx.subscribe()
    }

    /// Wait until the reveal is complete or its timer is gone.
    pub async fn wait_complete(&self) -> RevealView {
        let mut rx = self.subscribe();
        loop {
            let view = rx.borrow_and_update().clone();
            if !view.busy {
                return view;
            }
            if !self.is_running() {
                // The timer publishes before it exits, so this read sees its
                // last view.
                return rx.borrow_and_update().clone();
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }
}

impl Drop for RevealController {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Tick from `first_tick` on, once per `interval`. The first deadline is
/// fixed by `show`, not by when this task is first polled.
async fn run_timer(
    shared: Arc<Shared>,
    generation: u64,
    first_tick: Instant,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(first_tick, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let mut slot = shared.lock();
                if slot.generation != generation {
                    tracing::debug!("stale reveal tick ignored");
                    break;
                }
                slot.state.tick();
                shared.tx.send_replace(slot.state.view());
                if slot.state.is_complete() {
                    tracing::debug!("reveal complete after {} lines", slot.state.revealed());
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(100);

    async fn sleep(d: Duration) {
        tokio::time::sleep(d).await;
    }

    #[tokio::test(start_paused = true)]
    async fn reveals_one_line_per_interval() {
        let mut controller = RevealController::new(STEP);
        controller.show("line1\nline2\nline3", RenderMode::Animated);

        sleep(STEP / 2).await;
        assert_eq!(controller.view().text(), "");
        assert!(controller.view().is_busy());

        sleep(STEP).await;
        assert_eq!(controller.view().text(), "line1");
        assert!(controller.view().is_busy());

        sleep(STEP).await;
        assert_eq!(controller.view().text(), "line1\nline2");
        assert!(controller.view().is_busy());

        sleep(STEP).await;
        assert_eq!(controller.view().text(), "line1\nline2\nline3");
        assert!(!controller.view().is_busy());
        assert_eq!(controller.phase(), RevealPhase::Complete);

        sleep(STEP * 5).await;
        assert!(!controller.is_running());
        assert_eq!(controller.view().text(), "line1\nline2\nline3");
    }

    #[tokio::test(start_paused = true)]
    async fn subscriber_sees_every_state() {
        let mut controller = RevealController::new(STEP);
        let mut rx = controller.subscribe();
        controller.show("a\nb\n\nc", RenderMode::Animated);

        let mut seen = vec![rx.borrow_and_update().clone()];
        while seen.last().is_some_and(RevealView::is_busy) {
            rx.changed().await.unwrap();
            seen.push(rx.borrow_and_update().clone());
        }

        let texts: Vec<String> = seen.iter().map(RevealView::text).collect();
        assert_eq!(texts, vec!["", "a", "a\nb", "a\nb\n", "a\nb\n\nc"]);
    }

    #[tokio::test(start_paused = true)]
    async fn static_mode_needs_no_timer() {
        let mut controller = RevealController::new(STEP);
        controller.show("x\ny\nz", RenderMode::Static);
        assert!(!controller.is_running());
        assert_eq!(controller.view().text(), "x\ny\nz");
        assert!(!controller.view().is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_is_immediately_complete() {
        let mut controller = RevealController::new(STEP);
        controller.show("", RenderMode::Animated);
        assert!(!controller.is_running());
        assert_eq!(controller.view(), RevealView::default());
        assert_eq!(controller.phase(), RevealPhase::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn new_text_restarts_from_zero() {
        let mut controller = RevealController::new(STEP);
        controller.show("old1\nold2\nold3", RenderMode::Animated);
        sleep(STEP + STEP / 2).await;
        assert_eq!(controller.view().text(), "old1");

        controller.show("new1\nnew2", RenderMode::Animated);
        assert_eq!(controller.view().text(), "");
        assert!(controller.view().is_busy());

        sleep(STEP / 2).await;
        assert_eq!(controller.view().text(), "");
        sleep(STEP).await;
        assert_eq!(controller.view().text(), "new1");
        sleep(STEP).await;
        assert_eq!(controller.view().text(), "new1\nnew2");
        assert!(!controller.view().is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn showing_same_text_again_is_a_no_op() {
        let mut controller = RevealController::new(STEP);
        controller.show("one\ntwo", RenderMode::Animated);
        let final_view = controller.wait_complete().await;
        assert_eq!(final_view.text(), "one\ntwo");

        let mut rx = controller.subscribe();
        controller.show("one\ntwo", RenderMode::Animated);
        sleep(STEP * 4).await;
        assert!(!rx.has_changed().unwrap());
        assert!(!controller.is_running());
        assert_eq!(controller.view(), final_view);
    }

    #[tokio::test(start_paused = true)]
    async fn same_text_mid_reveal_keeps_progress() {
        let mut controller = RevealController::new(STEP);
        controller.show("p\nq\nr", RenderMode::Animated);
        sleep(STEP + STEP / 2).await;
        controller.show("p\nq\nr", RenderMode::Animated);
        assert_eq!(controller.view().text(), "p");
        assert!(controller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_message_freezes_fully_revealed() {
        let mut controller = RevealController::new(STEP);
        controller.show("1\n2\n3", RenderMode::Animated);
        sleep(STEP + STEP / 2).await;

        controller.show("1\n2\n3", RenderMode::Static);
        assert!(!controller.is_running());
        assert_eq!(controller.view().text(), "1\n2\n3");
        assert!(!controller.view().is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_further_ticks() {
        let mut controller = RevealController::new(STEP);
        controller.show("a\nb\nc\nd", RenderMode::Animated);
        sleep(STEP + STEP / 2).await;

        let mut rx = controller.subscribe();
        controller.cancel();
        sleep(STEP * 10).await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(controller.view().text(), "a");
        assert!(!controller.is_running());
        assert_eq!(controller.wait_complete().await.text(), "a");
    }

    #[tokio::test(start_paused = true)]
    async fn drop_releases_the_timer() {
        let mut controller = RevealController::new(STEP);
        controller.show("a\nb\nc", RenderMode::Animated);
        let mut rx = controller.subscribe();
        drop(controller);

        sleep(STEP * 10).await;
        assert_eq!(rx.borrow_and_update().text(), "");
        assert!(rx.changed().await.is_err(), "sender must be gone with the task");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_tick_is_ignored() {
        let controller = RevealController::new(STEP);
        {
            let mut slot = controller.shared.lock();
            slot.state = RevealState::new("x\ny");
            slot.state.start(RenderMode::Animated);
            slot.generation = 7;
        }
        let task = tokio::spawn(run_timer(
            Arc::clone(&controller.shared),
            6,
            Instant::now() + STEP,
            STEP,
            CancellationToken::new(),
        ));
        sleep(STEP * 3).await;

        assert!(task.is_finished());
        assert_eq!(controller.shared.lock().state.revealed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_is_one_interval_after_show() {
        let mut controller = RevealController::new(STEP);
        controller.show("a\nb", RenderMode::Animated);
        // The tick task is first polled half an interval after `show`.
        tokio::time::advance(STEP / 2).await;
        sleep(STEP / 2 + STEP / 10).await;
        assert_eq!(controller.view().text(), "a");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn wait_complete_never_returns_a_busy_view() {
        for _ in 0..50 {
            let mut controller = RevealController::new(Duration::from_millis(1));
            controller.show("a\nb", RenderMode::Animated);
            let view = controller.wait_complete().await;
            assert!(!view.is_busy());
            assert_eq!(view.text(), "a\nb");
        }
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn zero_interval_is_rejected() {
        let _ = RevealController::new(Duration::ZERO);
    }

    #[test]
    fn default_uses_fixed_cadence() {
        assert_eq!(RevealController::default().interval(), REVEAL_INTERVAL);
    }
}
