//! bestlocation - best-known-position arbitration over unreliable sources.
//!
//! This library selects the single best-known geographic position from
//! multiple concurrently updating, unreliable position sources (a coarse
//! network-based source and a precise but power-hungry satellite-based
//! source), and supervises each source with an independent staleness
//! watchdog that signals when updates stop arriving.
//!
//! # Selection logic
//!
//! A candidate replaces the held best fix when it is significantly newer
//! (more than two minutes), or more accurate within that window, or newer
//! without losing accuracy - with a same-lineage tie-break tolerating mild
//! accuracy loss. See [`model::is_better_fix`] for the exact ordering.
//!
//! # Components
//!
//! - [`state`] - [`LocationSample`] and [`SourceKind`] value types
//! - [`model`] - the decision function and the running best-fix state
//! - [`watchdog`] - per-source self-restarting staleness countdown
//! - [`session`] - [`TrackingSession`] lifecycle: start, seed, live
//!   dispatch, stop
//! - [`source`] - [`LocationSource`] collaborator trait (how samples get in)
//! - [`sink`] - [`BestLocationSink`] notification trait (how verdicts get out)
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use bestlocation::{SessionConfig, TrackingSession};
//!
//! let source: Arc<dyn bestlocation::LocationSource> = platform_source();
//! let sink = Arc::new(MySink);
//!
//! let config = SessionConfig::from_millis(true, true, 60_000, 30_000, 1_000, 10.0);
//! let session = TrackingSession::start(source, config, sink)?;
//!
//! // ... later
//! if let Some(best) = session.best_location() {
//!     println!("best fix: {best}");
//! }
//! session.stop();
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod session;
pub mod sink;
pub mod source;
pub mod state;
pub mod watchdog;

pub use config::SessionConfig;
pub use error::SessionError;
pub use model::{is_better_fix, BestLocationModel};
pub use session::TrackingSession;
pub use sink::BestLocationSink;
pub use source::{LocationSource, SourceEvent, UpdateRequest};
pub use state::{now_millis, LocationSample, SourceKind};
pub use watchdog::SourceWatchdog;

/// Version of the bestlocation library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
