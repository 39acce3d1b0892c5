//! Error types for session lifecycle.

use thiserror::Error;

/// Errors surfaced by [`TrackingSession`](crate::session::TrackingSession).
///
/// Degraded operation (a configured source being unavailable) is not an
/// error; the only failures are configuration contract violations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configuration disables both sources, so the session could never
    /// receive a sample.
    #[error("session configuration enables no sources")]
    NoEnabledSources,
}
