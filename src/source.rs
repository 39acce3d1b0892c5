//! Source collaborator trait - how raw position samples reach the session.
//!
//! The session never knows how positions are sensed; it asks a
//! [`LocationSource`] for continuous delivery into an event channel and for
//! one cached last-known sample per source at start.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::state::{LocationSample, SourceKind};

/// Delivery constraints passed through to the underlying sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateRequest {
    /// Minimum time between delivered samples.
    pub min_interval: Duration,

    /// Minimum movement between delivered samples, in meters.
    pub min_displacement_m: f32,
}

impl Default for UpdateRequest {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            min_displacement_m: 0.0,
        }
    }
}

/// Event emitted by a source into the session's dispatch queue.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// A live position sample. Its `source` field routes watchdog resets;
    /// samples without a recognizable tag carry [`SourceKind::Unknown`].
    Sample(LocationSample),

    /// Opaque status change, forwarded verbatim to the sink.
    Status { provider: String, status: i32 },

    /// The named provider became available.
    ProviderEnabled(String),

    /// The named provider became unavailable.
    ProviderDisabled(String),
}

/// Abstraction over platform position acquisition.
///
/// Implementations deliver events by sending on the channel handed to
/// [`request_updates`](Self::request_updates); the session owns the
/// receiving end and serializes all processing. `try_send` from a delivery
/// callback is acceptable - a full queue is the producer's concern.
pub trait LocationSource: Send + Sync {
    /// Is this source usable right now?
    ///
    /// An unavailable source is silently disabled for the session
    /// (degraded operation, not an error).
    fn is_available(&self, kind: SourceKind) -> bool;

    /// Begin continuous sample delivery for `kind` into `events`.
    fn request_updates(
        &self,
        kind: SourceKind,
        request: &UpdateRequest,
        events: mpsc::Sender<SourceEvent>,
    );

    /// Stop continuous delivery for `kind`.
    ///
    /// Idempotent - safe to call if delivery was never requested.
    fn cancel_updates(&self, kind: SourceKind);

    /// Fetch the source's cached last-known sample, if any.
    fn last_known(&self, kind: SourceKind) -> Option<LocationSample>;
}
