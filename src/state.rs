//! Core value types for location arbitration.
//!
//! This module defines the fundamental types used throughout the crate:
//!
//! - [`SourceKind`] - Which source produced a sample?
//! - [`LocationSample`] - Immutable position snapshot with metadata
//!
//! Samples are produced by the [`LocationSource`](crate::source::LocationSource)
//! collaborator and never mutated afterwards - the arbiter replaces its held
//! sample wholesale when a better one arrives.

use std::fmt;

/// Origin of a position sample.
///
/// The arbiter treats the two real sources symmetrically; the kind only
/// matters for the same-lineage tie-break in the decision function and for
/// routing watchdog resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Precise but power-hungry satellite-based source (GPS).
    Satellite,
    /// Coarse network-based source (cell/wifi).
    Network,
    /// Sample arrived without a recognizable source tag.
    ///
    /// Still competes on time and accuracy; forms its own lineage for the
    /// same-source tie-break and never resets any watchdog.
    Unknown,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satellite => write!(f, "satellite"),
            Self::Network => write!(f, "network"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Current wall-clock time as epoch milliseconds.
///
/// Convenience for producers and tests; the core itself only ever compares
/// producer-assigned timestamps against each other.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Immutable position sample.
///
/// Timestamps are producer-assigned epoch milliseconds - monotonic per
/// source but not globally. Accuracy is a radius in meters, smaller is
/// better. The coordinate payload (latitude, longitude, altitude, speed,
/// bearing) is opaque to the arbiter and passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSample {
    /// Which source produced this sample.
    pub source: SourceKind,

    /// When the producer measured this position (epoch millis).
    pub time: i64,

    /// Accuracy radius in meters (non-negative, smaller = better).
    pub accuracy: f32,

    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,

    /// Altitude in meters, 0.0 if unknown.
    pub altitude: f64,

    /// Speed in m/s, 0.0 if unknown.
    pub speed: f32,

    /// Bearing in degrees, 0.0 if unknown.
    pub bearing: f32,
}

impl LocationSample {
    /// Create a sample with position and quality fields only.
    ///
    /// Altitude, speed and bearing default to 0.0 (unknown).
    pub fn new(
        source: SourceKind,
        time: i64,
        accuracy: f32,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            source,
            time,
            accuracy,
            latitude,
            longitude,
            altitude: 0.0,
            speed: 0.0,
            bearing: 0.0,
        }
    }

    /// Attach motion payload (altitude, speed, bearing).
    pub fn with_motion(mut self, altitude: f64, speed: f32, bearing: f32) -> Self {
        self.altitude = altitude;
        self.speed = speed;
        self.bearing = bearing;
        self
    }

    /// Signed age of this sample relative to `now` in epoch millis.
    ///
    /// Positive when the sample lies in the past.
    pub fn age_millis(&self, now: i64) -> i64 {
        now - self.time
    }
}

impl fmt::Display for LocationSample {
    /// Log-friendly one-line rendering of the full sample.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{source: {}, time: {}, accuracy: {:.1}, latitude: {:.6}, longitude: {:.6}, \
             altitude: {:.1}, speed: {:.1}, bearing: {:.1}}}",
            self.source,
            self.time,
            self.accuracy,
            self.latitude,
            self.longitude,
            self.altitude,
            self.speed,
            self.bearing
        )
    }
}
