//! Idle expiry guard.
//!
//! # Responsibilities
//! - Count down toward a deadline, reset by `touch()`
//! - Fire a single cancellation signal when the deadline passes untouched
//! - Release the timer task on disposal
//!
//! # Design Decisions
//! - A dedicated timer task sleeps until the published deadline; `touch()`
//!   publishes a new deadline over a watch channel, so concurrent touches
//!   from both pumps are plain last-write-wins sends
//! - Expired is terminal: the timer task exits after cancelling, and later
//!   touches are no-ops (the watch receiver is gone)

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Single-fire expiry clock for one session.
///
/// Owned by the session orchestrator; pumps hold it behind an `Arc` and only
/// call [`IdleGuard::touch`].
pub struct IdleGuard {
    duration: Duration,
    deadline: watch::Sender<Instant>,
    token: CancellationToken,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl IdleGuard {
    /// Start the clock. The first deadline is `now + duration`.
    pub fn new(duration: Duration) -> Self {
        let token = CancellationToken::new();
        let (deadline, mut rx) = watch::channel(Instant::now() + duration);

        let expiry_token = token.clone();
        let timer = tokio::spawn(async move {
            loop {
                let deadline = *rx.borrow_and_update();
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        // A touch may have landed while the sleep was firing.
                        if rx.has_changed().unwrap_or(false) {
                            continue;
                        }
                        expiry_token.cancel();
                        break;
                    }
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            duration,
            deadline,
            token,
            timer: Mutex::new(Some(timer)),
        }
    }

    /// Reschedule the deadline to `now + duration`.
    ///
    /// No-op once expired or disposed. Safe to call concurrently.
    pub fn touch(&self) {
        let _ = self.deadline.send(Instant::now() + self.duration);
    }

    /// The cancellation signal fired on expiry.
    ///
    /// Callers that need a cancel source of their own should take a child of
    /// this token; cancelling the child does not mark the guard expired.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// True once the deadline passed and the signal fired.
    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop the timer task. Idempotent; fine to call before or after expiry.
    pub fn dispose(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for IdleGuard {
    fn drop(&mut self) {
        self.dispose();
    }
}
