//! Session configuration.

use std::time::Duration;

use crate::source::UpdateRequest;
use crate::state::SourceKind;

/// Configuration snapshot for one tracking session.
///
/// Immutable after session start; a new session takes a fresh snapshot.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Enable the coarse network-based source.
    pub use_network: bool,

    /// Enable the precise satellite-based source.
    pub use_satellite: bool,

    /// Watchdog duration for the network source; `None` disables it.
    pub network_timeout: Option<Duration>,

    /// Watchdog duration for the satellite source; `None` disables it.
    pub satellite_timeout: Option<Duration>,

    /// Minimum time between delivered samples, passed through to sources.
    pub min_update_interval: Duration,

    /// Minimum movement between delivered samples, passed through to sources.
    pub min_displacement_m: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            use_network: true,
            use_satellite: true,
            network_timeout: None,
            satellite_timeout: None,
            min_update_interval: Duration::from_secs(1),
            min_displacement_m: 0.0,
        }
    }
}

impl SessionConfig {
    /// Build a config from raw millisecond/meter values.
    ///
    /// A timeout of zero or less disables that source's watchdog.
    pub fn from_millis(
        use_network: bool,
        use_satellite: bool,
        network_timeout_ms: i64,
        satellite_timeout_ms: i64,
        min_update_interval_ms: i64,
        min_displacement_m: f32,
    ) -> Self {
        Self {
            use_network,
            use_satellite,
            network_timeout: positive_millis(network_timeout_ms),
            satellite_timeout: positive_millis(satellite_timeout_ms),
            min_update_interval: positive_millis(min_update_interval_ms).unwrap_or(Duration::ZERO),
            min_displacement_m,
        }
    }

    /// Is this source kind enabled by configuration?
    pub fn uses(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Network => self.use_network,
            SourceKind::Satellite => self.use_satellite,
            SourceKind::Unknown => false,
        }
    }

    /// Watchdog duration configured for this source kind, if any.
    pub fn timeout_for(&self, kind: SourceKind) -> Option<Duration> {
        match kind {
            SourceKind::Network => self.network_timeout,
            SourceKind::Satellite => self.satellite_timeout,
            SourceKind::Unknown => None,
        }
    }

    /// Delivery constraints handed to the source collaborator.
    pub fn update_request(&self) -> UpdateRequest {
        UpdateRequest {
            min_interval: self.min_update_interval,
            min_displacement_m: self.min_displacement_m,
        }
    }
}

fn positive_millis(ms: i64) -> Option<Duration> {
    if ms > 0 {
        Some(Duration::from_millis(ms as u64))
    } else {
        None
    }
}
