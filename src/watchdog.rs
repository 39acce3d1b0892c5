//! Source watchdog - per-source staleness countdown with self-restart.
//!
//! One watchdog runs per enabled source. It is armed immediately on spawn
//! and is always counting down: an accepted live sample [`reset`]s it, an
//! elapsed deadline fires [`BestLocationSink::on_watchdog_expired`] and
//! re-arms with the identical duration. Expiry is a cycle, not a failure.
//!
//! # States
//!
//! `Running(deadline)` from spawn until [`cancel`], which is terminal.
//! There is no idle state.
//!
//! # Timing tolerance
//!
//! The countdown waits on a precise `sleep_until`; expiry detection can lag
//! the nominal deadline by scheduler latency. A reset that crosses an
//! in-flight expiry may let that one expiry through - callers treat a
//! post-cancel or post-reset notification as noise, and no further expiry
//! is delivered once cancellation is observed by the watchdog's own loop.
//!
//! [`reset`]: SourceWatchdog::reset
//! [`cancel`]: SourceWatchdog::cancel
//! [`BestLocationSink::on_watchdog_expired`]: crate::sink::BestLocationSink::on_watchdog_expired

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::sink::BestLocationSink;
use crate::state::SourceKind;

/// Handle to a running watchdog task.
///
/// Dropping the handle cancels the watchdog.
pub struct SourceWatchdog {
    kind: SourceKind,
    duration: Duration,
    deadline_tx: watch::Sender<Instant>,
    cancel: CancellationToken,
}

impl SourceWatchdog {
    /// Spawn a watchdog for `kind`, armed at `now + duration`.
    ///
    /// Must be called within a tokio runtime. Expiries are delivered to
    /// `sink` from the watchdog's own task.
    pub fn spawn(kind: SourceKind, duration: Duration, sink: Arc<dyn BestLocationSink>) -> Self {
        let (deadline_tx, deadline_rx) = watch::channel(Instant::now() + duration);
        let cancel = CancellationToken::new();

        tokio::spawn(run(kind, duration, deadline_rx, cancel.clone(), sink));
        tracing::debug!(source = %kind, timeout_ms = duration.as_millis() as u64, "watchdog armed");

        Self {
            kind,
            duration,
            deadline_tx,
            cancel,
        }
    }

    /// Which source this watchdog supervises.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Re-arm the countdown at `now + duration`.
    ///
    /// No-op after cancellation - a cancelled watchdog is never
    /// resurrected.
    pub fn reset(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let _ = self.deadline_tx.send(Instant::now() + self.duration);
        tracing::trace!(source = %self.kind, "watchdog reset");
    }

    /// Cancel the watchdog. Terminal and idempotent.
    ///
    /// Fire-and-forget: does not wait for the background loop to exit. An
    /// expiry already in flight may still be delivered, but none after the
    /// loop observes cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Has this watchdog been cancelled?
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for SourceWatchdog {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Watchdog loop: wait for cancel, reset, or deadline - in that priority.
async fn run(
    kind: SourceKind,
    duration: Duration,
    mut deadline_rx: watch::Receiver<Instant>,
    cancel: CancellationToken,
    sink: Arc<dyn BestLocationSink>,
) {
    let mut deadline = *deadline_rx.borrow_and_update();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = deadline_rx.changed() => {
                match changed {
                    Ok(()) => deadline = *deadline_rx.borrow_and_update(),
                    // Handle dropped without explicit cancel.
                    Err(_) => break,
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                tracing::debug!(source = %kind, "source quiet past deadline");
                sink.on_watchdog_expired(kind);
                // Expiry is a cycle: re-arm with the identical duration.
                deadline = Instant::now() + duration;
            }
        }
    }

    tracing::debug!(source = %kind, "watchdog stopped");
}
