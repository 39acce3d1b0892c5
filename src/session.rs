//! Tracking session - lifecycle around the best-location model.
//!
//! A [`TrackingSession`] is started with a configuration snapshot, a
//! [`LocationSource`] collaborator and a [`BestLocationSink`]. On start it:
//!
//! 1. Checks availability of each configured source; an unavailable source
//!    is silently disabled for this session (degraded operation).
//! 2. Requests continuous sample delivery for each enabled source and arms
//!    a [`SourceWatchdog`] where a timeout is configured.
//! 3. Seeds the best fix from each source's cached last-known sample,
//!    network before satellite, notifying the sink with `is_fresh = false`.
//!
//! All sample processing - live and cached - funnels through one lock
//! around the model, and live events arrive on a single dispatch task, so
//! concurrent arrivals from the two sources never interleave on the
//! current-best state. Only accepted live samples reset the owning source's
//! watchdog: a stream of rejected-but-arriving samples does not count as
//! liveness.
//!
//! No best fix survives a stop/start cycle; callers wanting continuity read
//! [`best_location`](TrackingSession::best_location) back and re-seed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::model::BestLocationModel;
use crate::sink::BestLocationSink;
use crate::source::{LocationSource, SourceEvent};
use crate::state::{LocationSample, SourceKind};
use crate::watchdog::SourceWatchdog;

/// Capacity of the live event queue between sources and the dispatch task.
const EVENT_QUEUE_DEPTH: usize = 32;

/// Mutable session state behind the single serialization point.
struct SessionState {
    model: BestLocationModel,
    network_watchdog: Option<SourceWatchdog>,
    satellite_watchdog: Option<SourceWatchdog>,
}

struct Shared {
    source: Arc<dyn LocationSource>,
    sink: Arc<dyn BestLocationSink>,
    state: RwLock<SessionState>,
    cancel: CancellationToken,
    stopped: AtomicBool,
    network_enabled: bool,
    satellite_enabled: bool,
}

/// A running arbitration session.
///
/// Created by [`start`](Self::start); stopped explicitly via
/// [`stop`](Self::stop) or implicitly on drop.
pub struct TrackingSession {
    shared: Arc<Shared>,
    config: SessionConfig,
}

impl TrackingSession {
    /// Start tracking.
    ///
    /// Must be called within a tokio runtime. Returns
    /// [`SessionError::NoEnabledSources`] if the configuration disables
    /// both sources; a configured-but-unavailable source is merely logged
    /// and skipped.
    pub fn start(
        source: Arc<dyn LocationSource>,
        config: SessionConfig,
        sink: Arc<dyn BestLocationSink>,
    ) -> Result<Self, SessionError> {
        if !config.use_network && !config.use_satellite {
            return Err(SessionError::NoEnabledSources);
        }

        let network_enabled = probe(&*source, &config, SourceKind::Network);
        let satellite_enabled = probe(&*source, &config, SourceKind::Satellite);

        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let request = config.update_request();

        let mut network_watchdog = None;
        let mut satellite_watchdog = None;

        if network_enabled {
            source.request_updates(SourceKind::Network, &request, event_tx.clone());
            if let Some(timeout) = config.timeout_for(SourceKind::Network) {
                network_watchdog =
                    Some(SourceWatchdog::spawn(SourceKind::Network, timeout, sink.clone()));
            }
        }

        if satellite_enabled {
            source.request_updates(SourceKind::Satellite, &request, event_tx);
            if let Some(timeout) = config.timeout_for(SourceKind::Satellite) {
                satellite_watchdog =
                    Some(SourceWatchdog::spawn(SourceKind::Satellite, timeout, sink.clone()));
            }
        }

        let shared = Arc::new(Shared {
            source,
            sink,
            state: RwLock::new(SessionState {
                model: BestLocationModel::new(),
                network_watchdog,
                satellite_watchdog,
            }),
            cancel: CancellationToken::new(),
            stopped: AtomicBool::new(false),
            network_enabled,
            satellite_enabled,
        });

        tokio::spawn(dispatch(shared.clone(), event_rx));

        tracing::info!(
            network = network_enabled,
            satellite = satellite_enabled,
            "tracking session started"
        );

        // Seed from cached last-known samples, network before satellite.
        // The second evaluation uses the first's result as its baseline.
        for kind in [SourceKind::Network, SourceKind::Satellite] {
            if !shared.enabled(kind) {
                continue;
            }
            if let Some(sample) = shared.source.last_known(kind) {
                shared.handle_sample(sample, kind, false);
            }
        }

        Ok(Self { shared, config })
    }

    /// Stop tracking: unregister continuous delivery and cancel both
    /// watchdogs. Idempotent; does not wait for background loops to exit.
    ///
    /// A sample or expiry already in flight when stop is called may still
    /// be dropped silently by the cancelled dispatch loop; it is never
    /// surfaced as an error.
    pub fn stop(&self) {
        if self.shared.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("stopping tracking session");

        if self.shared.network_enabled {
            self.shared.source.cancel_updates(SourceKind::Network);
        }
        if self.shared.satellite_enabled {
            self.shared.source.cancel_updates(SourceKind::Satellite);
        }

        let mut state = self.shared.state.write().unwrap();
        if let Some(watchdog) = state.network_watchdog.take() {
            watchdog.cancel();
        }
        if let Some(watchdog) = state.satellite_watchdog.take() {
            watchdog.cancel();
        }
        drop(state);

        self.shared.cancel.cancel();
    }

    /// The currently held best fix, if any sample has been accepted.
    pub fn best_location(&self) -> Option<LocationSample> {
        self.shared.state.read().unwrap().model.current().cloned()
    }

    /// Has any fix been accepted yet?
    pub fn has_fix(&self) -> bool {
        self.shared.state.read().unwrap().model.has_fix()
    }

    /// Is this source enabled for this session (configured and available
    /// at start)?
    pub fn source_enabled(&self, kind: SourceKind) -> bool {
        self.shared.enabled(kind)
    }

    /// Has the session been stopped?
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// The configuration snapshot this session was started with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn probe(source: &dyn LocationSource, config: &SessionConfig, kind: SourceKind) -> bool {
    if !config.uses(kind) {
        return false;
    }
    let available = source.is_available(kind);
    if !available {
        tracing::info!(source = %kind, "source unavailable, disabled for this session");
    }
    available
}

impl Shared {
    fn enabled(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Network => self.network_enabled,
            SourceKind::Satellite => self.satellite_enabled,
            SourceKind::Unknown => false,
        }
    }

    /// Run one sample through the decision function and apply the result.
    ///
    /// `kind` is the sample's lineage for live samples and the queried
    /// source for cached seeds. The watchdog reset happens under the state
    /// lock, so the new deadline is installed before any later sample for
    /// the same source is examined.
    fn handle_sample(&self, sample: LocationSample, kind: SourceKind, is_fresh: bool) {
        let mut state = self.state.write().unwrap();
        if !state.model.apply_update(sample.clone()) {
            tracing::trace!(source = %kind, "sample rejected, keeping current best");
            return;
        }

        tracing::debug!(source = %kind, is_fresh, %sample, "best location replaced");

        // Only an accepted live sample proves the source alive; cached
        // seeds and rejected samples leave the countdown running.
        if is_fresh {
            let watchdog = match kind {
                SourceKind::Network => state.network_watchdog.as_ref(),
                SourceKind::Satellite => state.satellite_watchdog.as_ref(),
                SourceKind::Unknown => None,
            };
            if let Some(watchdog) = watchdog {
                watchdog.reset();
            }
        }
        drop(state);

        self.sink.on_best_location_changed(&sample, kind, is_fresh);
    }

    fn handle_event(&self, event: SourceEvent) {
        match event {
            SourceEvent::Sample(sample) => {
                let kind = sample.source;
                self.handle_sample(sample, kind, true);
            }
            SourceEvent::Status { provider, status } => {
                self.sink.on_source_status(&provider, status);
            }
            SourceEvent::ProviderEnabled(provider) => {
                self.sink.on_source_enabled(&provider);
            }
            SourceEvent::ProviderDisabled(provider) => {
                self.sink.on_source_disabled(&provider);
            }
        }
    }
}

/// Single-owner event loop: every live event is processed here, in arrival
/// order per source, until stop or until all source senders are dropped.
async fn dispatch(shared: Arc<Shared>, mut events: mpsc::Receiver<SourceEvent>) {
    loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => shared.handle_event(event),
                None => break,
            }
        }
    }
    tracing::debug!("session dispatch stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::UpdateRequest;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory source collaborator for session tests.
    #[derive(Default)]
    struct MockSource {
        unavailable: Vec<SourceKind>,
        cached: HashMap<SourceKind, LocationSample>,
        requests: Mutex<Vec<SourceKind>>,
        cancels: Mutex<Vec<SourceKind>>,
        events: Mutex<Option<mpsc::Sender<SourceEvent>>>,
    }

    impl MockSource {
        fn with_cache(mut self, kind: SourceKind, sample: LocationSample) -> Self {
            self.cached.insert(kind, sample);
            self
        }

        fn without(mut self, kind: SourceKind) -> Self {
            self.unavailable.push(kind);
            self
        }

        fn push(&self, sample: LocationSample) {
            let events = self.events.lock().unwrap();
            let tx = events.as_ref().expect("updates not requested");
            tx.try_send(SourceEvent::Sample(sample)).unwrap();
        }
    }

    impl LocationSource for MockSource {
        fn is_available(&self, kind: SourceKind) -> bool {
            !self.unavailable.contains(&kind)
        }

        fn request_updates(
            &self,
            kind: SourceKind,
            _request: &UpdateRequest,
            events: mpsc::Sender<SourceEvent>,
        ) {
            self.requests.lock().unwrap().push(kind);
            *self.events.lock().unwrap() = Some(events);
        }

        fn cancel_updates(&self, kind: SourceKind) {
            self.cancels.lock().unwrap().push(kind);
        }

        fn last_known(&self, kind: SourceKind) -> Option<LocationSample> {
            self.cached.get(&kind).cloned()
        }
    }

    /// Sink recording best-location notifications.
    #[derive(Default)]
    struct RecordingSink {
        updates: Mutex<Vec<(LocationSample, SourceKind, bool)>>,
        statuses: Mutex<Vec<(String, i32)>>,
        expired: Mutex<Vec<SourceKind>>,
    }

    impl RecordingSink {
        fn updates(&self) -> Vec<(LocationSample, SourceKind, bool)> {
            self.updates.lock().unwrap().clone()
        }
    }

    impl BestLocationSink for RecordingSink {
        fn on_best_location_changed(
            &self,
            sample: &LocationSample,
            kind: SourceKind,
            is_fresh: bool,
        ) {
            self.updates.lock().unwrap().push((sample.clone(), kind, is_fresh));
        }

        fn on_watchdog_expired(&self, kind: SourceKind) {
            self.expired.lock().unwrap().push(kind);
        }

        fn on_source_status(&self, provider: &str, status: i32) {
            self.statuses.lock().unwrap().push((provider.to_string(), status));
        }
    }

    fn sample(source: SourceKind, time: i64, accuracy: f32) -> LocationSample {
        LocationSample::new(source, time, accuracy, 53.5, 10.0)
    }

    const T: i64 = 1_700_000_000_000;

    /// Let the dispatch task drain the queue.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_start_with_no_sources_is_an_error() {
        let source = Arc::new(MockSource::default());
        let sink = Arc::new(RecordingSink::default());
        let config = SessionConfig {
            use_network: false,
            use_satellite: false,
            ..Default::default()
        };

        let result = TrackingSession::start(source, config, sink);
        assert!(matches!(result, Err(SessionError::NoEnabledSources)));
    }

    #[tokio::test]
    async fn test_unavailable_source_degrades_silently() {
        let source = Arc::new(MockSource::default().without(SourceKind::Satellite));
        let sink = Arc::new(RecordingSink::default());

        let session =
            TrackingSession::start(source.clone(), SessionConfig::default(), sink).unwrap();

        assert!(session.source_enabled(SourceKind::Network));
        assert!(!session.source_enabled(SourceKind::Satellite));
        // Updates requested only for the enabled source.
        assert_eq!(*source.requests.lock().unwrap(), vec![SourceKind::Network]);
    }

    #[tokio::test]
    async fn test_seeding_evaluates_network_cache_before_satellite() {
        // Satellite cache is older but far more accurate: it wins against
        // the network baseline under the in-window accuracy rule, so both
        // seeds are reported and satellite ends up held.
        let source = Arc::new(
            MockSource::default()
                .with_cache(SourceKind::Network, sample(SourceKind::Network, T, 800.0))
                .with_cache(SourceKind::Satellite, sample(SourceKind::Satellite, T - 10, 8.0)),
        );
        let sink = Arc::new(RecordingSink::default());

        let session =
            TrackingSession::start(source, SessionConfig::default(), sink.clone()).unwrap();

        let updates = sink.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].1, SourceKind::Network);
        assert_eq!(updates[1].1, SourceKind::Satellite);
        assert!(updates.iter().all(|(_, _, is_fresh)| !is_fresh));
        assert_eq!(session.best_location().unwrap().source, SourceKind::Satellite);
    }

    #[tokio::test]
    async fn test_losing_cached_seed_is_not_reported() {
        // Fresh network cache beats a much older satellite cache.
        let source = Arc::new(
            MockSource::default()
                .with_cache(SourceKind::Network, sample(SourceKind::Network, T, 100.0))
                .with_cache(
                    SourceKind::Satellite,
                    sample(SourceKind::Satellite, T - 300_000, 5.0),
                ),
        );
        let sink = Arc::new(RecordingSink::default());

        let session =
            TrackingSession::start(source, SessionConfig::default(), sink.clone()).unwrap();

        let updates = sink.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, SourceKind::Network);
        assert_eq!(session.best_location().unwrap().source, SourceKind::Network);
    }

    #[tokio::test]
    async fn test_live_sample_updates_best_and_notifies_fresh() {
        let source = Arc::new(MockSource::default());
        let sink = Arc::new(RecordingSink::default());
        let session =
            TrackingSession::start(source.clone(), SessionConfig::default(), sink.clone())
                .unwrap();

        source.push(sample(SourceKind::Satellite, T, 10.0));
        settle().await;

        let updates = sink.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, SourceKind::Satellite);
        assert!(updates[0].2, "live sample must report is_fresh");
        assert_eq!(session.best_location().unwrap().time, T);
    }

    #[tokio::test]
    async fn test_rejected_live_sample_is_silent() {
        let source = Arc::new(MockSource::default());
        let sink = Arc::new(RecordingSink::default());
        let session =
            TrackingSession::start(source.clone(), SessionConfig::default(), sink.clone())
                .unwrap();

        source.push(sample(SourceKind::Satellite, T, 10.0));
        // Older, less accurate, other lineage - rejected.
        source.push(sample(SourceKind::Network, T - 10, 900.0));
        settle().await;

        assert_eq!(sink.updates().len(), 1);
        assert_eq!(session.best_location().unwrap().source, SourceKind::Satellite);
    }

    #[tokio::test]
    async fn test_status_events_forwarded_verbatim() {
        let source = Arc::new(MockSource::default());
        let sink = Arc::new(RecordingSink::default());
        let _session =
            TrackingSession::start(source.clone(), SessionConfig::default(), sink.clone())
                .unwrap();

        let tx = source.events.lock().unwrap().clone().unwrap();
        tx.try_send(SourceEvent::Status {
            provider: "network".into(),
            status: 2,
        })
        .unwrap();
        settle().await;

        assert_eq!(*sink.statuses.lock().unwrap(), vec![("network".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_stop_unregisters_and_is_idempotent() {
        let source = Arc::new(MockSource::default());
        let sink = Arc::new(RecordingSink::default());
        let session =
            TrackingSession::start(source.clone(), SessionConfig::default(), sink.clone())
                .unwrap();

        session.stop();
        session.stop();
        assert!(session.is_stopped());

        let cancels = source.cancels.lock().unwrap().clone();
        assert_eq!(cancels, vec![SourceKind::Network, SourceKind::Satellite]);
    }

    #[tokio::test]
    async fn test_events_after_stop_are_dropped() {
        let source = Arc::new(MockSource::default());
        let sink = Arc::new(RecordingSink::default());
        let session =
            TrackingSession::start(source.clone(), SessionConfig::default(), sink.clone())
                .unwrap();

        session.stop();
        settle().await;

        // The dispatch loop is gone; a late event must not be surfaced.
        let tx = source.events.lock().unwrap().clone().unwrap();
        let _ = tx.try_send(SourceEvent::Sample(sample(SourceKind::Network, T, 50.0)));
        settle().await;

        assert!(sink.updates().is_empty());
        assert!(session.best_location().is_none());
    }

    #[tokio::test]
    async fn test_no_fix_survives_stop_start_cycle() {
        let source = Arc::new(MockSource::default());
        let sink = Arc::new(RecordingSink::default());

        let session =
            TrackingSession::start(source.clone(), SessionConfig::default(), sink.clone())
                .unwrap();
        source.push(sample(SourceKind::Network, T, 50.0));
        settle().await;
        assert!(session.has_fix());
        session.stop();

        let session2 =
            TrackingSession::start(source.clone(), SessionConfig::default(), sink).unwrap();
        assert!(!session2.has_fix());
    }

    #[tokio::test]
    async fn test_unknown_sample_never_resets_watchdogs() {
        // A session with a short network watchdog: pushing accepted Unknown
        // samples must not keep it alive.
        let source = Arc::new(MockSource::default().without(SourceKind::Satellite));
        let sink = Arc::new(RecordingSink::default());
        let config = SessionConfig {
            network_timeout: Some(Duration::from_millis(40)),
            ..Default::default()
        };
        let session = TrackingSession::start(source.clone(), config, sink.clone()).unwrap();

        // Accepted unknown-lineage samples, each newer than the last.
        for i in 0..4 {
            source.push(sample(SourceKind::Unknown, T + i, 50.0));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        // The network watchdog was never reset, so it expired despite
        // accepted samples arriving the whole time.
        assert!(!sink.expired.lock().unwrap().is_empty());
        assert_eq!(session.best_location().unwrap().source, SourceKind::Unknown);
        session.stop();
    }
}
