//! Sink trait - notifications delivered to the session's caller.

use crate::state::{LocationSample, SourceKind};

/// Receiver for session notifications.
///
/// All hooks are one-way, fire-and-forget callbacks invoked from the
/// session's dispatch task or a watchdog task; implementations must not
/// block, so they cannot stall sample delivery.
pub trait BestLocationSink: Send + Sync {
    /// The session accepted a sample as the new best fix.
    ///
    /// `is_fresh` distinguishes a sample delivered live while tracking from
    /// one retrieved once from a source's cache at session start.
    fn on_best_location_changed(&self, sample: &LocationSample, kind: SourceKind, is_fresh: bool);

    /// A source has been quiet past its configured timeout.
    ///
    /// A recurring, expected signal, not an error - the watchdog re-arms
    /// itself after firing.
    fn on_watchdog_expired(&self, kind: SourceKind);

    /// Status change forwarded verbatim from the source collaborator.
    fn on_source_status(&self, provider: &str, status: i32) {
        let _ = (provider, status);
    }

    /// Provider-enabled notification forwarded verbatim.
    fn on_source_enabled(&self, provider: &str) {
        let _ = provider;
    }

    /// Provider-disabled notification forwarded verbatim.
    fn on_source_disabled(&self, provider: &str) {
        let _ = provider;
    }
}
