//! Admission decisions.
//!
//! The [`AdmissionController`] answers "admit or reject" for a request to a
//! virtual host, advancing that host's window exactly once per decision.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Storage};
use crate::application::store::{HostRecord, StoreError, WindowStore, WrongStrategy};
use crate::domain::config::{Strategy, VirtualHostLimitConfig};
use crate::domain::host::HostId;
use crate::domain::policy::{fixed_window_verdict, sliding_window_verdict, Verdict};
use crate::domain::report::HostReport;
use crate::domain::window::FixedAdvance;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What a decision did to the host's window.
enum Advance {
    Disabled,
    Sliding { evicted: Option<u64> },
    Fixed(FixedAdvance),
}

/// Coordinates admission decisions over a [`WindowStore`].
#[derive(Clone)]
pub struct AdmissionController<S>
where
    S: Storage<HostId, HostRecord> + Clone,
{
    store: WindowStore<S>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl<S> AdmissionController<S>
where
    S: Storage<HostId, HostRecord> + Clone,
{
    /// Create a controller.
    ///
    /// # Arguments
    /// * `store` - Per-host window state, already populated
    /// * `clock` - Time source for [`check`](Self::check)
    /// * `metrics` - Outcome counters
    pub fn new(store: WindowStore<S>, clock: Arc<dyn Clock>, metrics: Metrics) -> Self {
        Self {
            store,
            clock,
            metrics,
        }
    }

    /// Decide whether a request to `host` arriving at `now` is admitted.
    ///
    /// - Disabled hosts are always admitted and their state is not touched.
    /// - Sliding window: the ring advances and the request is rejected if the
    ///   admission 64 calls ago happened at most `window_seconds` before `now`.
    /// - Fixed window: the counter advances (resetting first once `now`
    ///   reaches the window end) and the request is rejected if the count
    ///   exceeds `max_connections`.
    ///
    /// # Fail-Open Behavior
    /// A host with no registered state is admitted. That situation is a
    /// registration bug, and rejecting would take down unrelated traffic.
    ///
    /// # Performance
    /// One map lookup and one short per-host critical section. Never blocks
    /// on other hosts and never allocates on the admit path.
    pub fn decide(&self, host: &str, now: u64) -> Verdict {
        let result = self.store.with_record(host, |record| {
            let config = *record.config();
            advance(record, &config, now).map(|advance| (config, advance))
        });

        let verdict = match result {
            Ok(Ok((config, advance))) => Self::judge(host, &config, now, advance),
            Ok(Err(wrong)) => {
                error!(
                    host,
                    expected = %wrong.expected,
                    actual = %wrong.actual,
                    "window state does not match configured strategy, admitting"
                );
                Verdict::Admit
            }
            Err(StoreError::UnknownHost(_)) => {
                warn!(host, "admission check for unregistered host, admitting");
                self.metrics.record_unknown_host();
                Verdict::Admit
            }
            Err(other) => {
                error!(host, error = %other, "admission check failed, admitting");
                Verdict::Admit
            }
        };

        match verdict {
            Verdict::Admit => self.metrics.record_admitted(),
            Verdict::Reject => self.metrics.record_rejected(),
        }

        verdict
    }

    /// Decide for a request to `host` arriving now, per the injected clock.
    pub fn check(&self, host: &str) -> Verdict {
        self.decide(host, self.clock.now())
    }

    /// Status rows for every enabled host, sorted by host name.
    ///
    /// Read-only: no window is advanced or reset by reporting.
    pub fn status(&self, now: u64) -> Vec<HostReport> {
        let mut rows = Vec::with_capacity(self.store.len());
        self.store.for_each(|host, record| {
            if record.config().is_enabled() {
                rows.push(HostReport::from_snapshot(host.clone(), &record.snapshot(), now));
            }
        });
        rows.sort_by(|a, b| a.host.cmp(&b.host));
        rows
    }

    /// Status rows as of the injected clock's current time.
    pub fn status_now(&self) -> Vec<HostReport> {
        self.status(self.clock.now())
    }

    /// Get a reference to the window store.
    pub fn store(&self) -> &WindowStore<S> {
        &self.store
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get a reference to the clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn judge(host: &str, config: &VirtualHostLimitConfig, now: u64, advance: Advance) -> Verdict {
        match advance {
            Advance::Disabled => Verdict::Admit,
            Advance::Sliding { evicted } => {
                let verdict = sliding_window_verdict(now, evicted, config.window_seconds());
                if verdict.is_reject() {
                    debug!(
                        host,
                        strategy = %Strategy::SlidingWindow,
                        oldest_age = evicted.map(|at| now.saturating_sub(at)),
                        window_seconds = config.window_seconds(),
                        "rejecting request"
                    );
                }
                verdict
            }
            Advance::Fixed(FixedAdvance { count, .. }) => {
                let verdict = fixed_window_verdict(count, config.max_connections());
                if verdict.is_reject() {
                    debug!(
                        host,
                        strategy = %Strategy::FixedWindow,
                        count,
                        limit = config.max_connections(),
                        "rejecting request"
                    );
                }
                verdict
            }
        }
    }
}

fn advance(
    record: &HostRecord,
    config: &VirtualHostLimitConfig,
    now: u64,
) -> Result<Advance, WrongStrategy> {
    if !config.is_enabled() {
        return Ok(Advance::Disabled);
    }
    match config.strategy() {
        Strategy::SlidingWindow => record
            .advance_sliding_window(now)
            .map(|evicted| Advance::Sliding { evicted }),
        Strategy::FixedWindow => record.advance_fixed_window(now).map(Advance::Fixed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::ReportDetail;
    use crate::domain::window::{WindowState, SLIDING_WINDOW_DEPTH};
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::storage::ShardedStorage;

    type TestController = AdmissionController<Arc<ShardedStorage<HostId, HostRecord>>>;

    fn setup(hosts: &[(&str, VirtualHostLimitConfig)]) -> (TestController, MockClock) {
        let store = WindowStore::new(Arc::new(ShardedStorage::new()));
        for (name, config) in hosts {
            store.create_host(HostId::new(name), *config).unwrap();
        }
        let clock = MockClock::new(1_000);
        let controller = AdmissionController::new(store, Arc::new(clock.clone()), Metrics::new());
        (controller, clock)
    }

    #[test]
    fn test_fixed_window_scenario() {
        let (controller, _) = setup(&[(
            "f",
            VirtualHostLimitConfig::fixed_window(2, 10).unwrap(),
        )]);

        assert_eq!(controller.decide("f", 0), Verdict::Admit);
        assert_eq!(controller.decide("f", 1), Verdict::Admit);
        assert_eq!(controller.decide("f", 2), Verdict::Reject);
        assert_eq!(controller.decide("f", 10), Verdict::Admit);

        match controller.store().read("f").unwrap().state {
            WindowState::Fixed(window) => assert_eq!(window.current_count(), 1),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_sliding_window_scenario() {
        let config = VirtualHostLimitConfig::sliding_window(10).unwrap();

        let (controller, _) = setup(&[("s", config)]);
        for _ in 0..SLIDING_WINDOW_DEPTH {
            assert_eq!(controller.decide("s", 0), Verdict::Admit);
        }
        assert_eq!(controller.decide("s", 5), Verdict::Reject);

        let (controller, _) = setup(&[("s", config)]);
        for _ in 0..SLIDING_WINDOW_DEPTH {
            assert_eq!(controller.decide("s", 0), Verdict::Admit);
        }
        assert_eq!(controller.decide("s", 15), Verdict::Admit);
    }

    #[test]
    fn test_sliding_ignores_max_connections() {
        let config = VirtualHostLimitConfig::sliding_window(10).unwrap();
        assert_eq!(config.max_connections(), 100);

        let (controller, _) = setup(&[("s", config)]);
        let admitted = (0..100)
            .filter(|_| controller.decide("s", 500).is_admit())
            .count();
        assert_eq!(admitted, SLIDING_WINDOW_DEPTH);
    }

    #[test]
    fn test_disabled_host_is_untouched() {
        let config = VirtualHostLimitConfig::fixed_window(0, 10)
            .unwrap()
            .with_enabled(false);
        let (controller, _) = setup(&[("off", config)]);
        let before = controller.store().read("off").unwrap();

        for t in 0..100 {
            assert_eq!(controller.decide("off", t), Verdict::Admit);
        }
        assert_eq!(controller.store().read("off").unwrap(), before);
    }

    #[test]
    fn test_unknown_host_fails_open() {
        let (controller, _) = setup(&[]);

        assert_eq!(controller.decide("ghost", 1), Verdict::Admit);
        assert_eq!(controller.metrics().unknown_hosts(), 1);
        assert_eq!(controller.metrics().requests_admitted(), 1);
    }

    #[test]
    fn test_check_uses_clock() {
        let (controller, clock) = setup(&[(
            "f",
            VirtualHostLimitConfig::fixed_window(1, 10).unwrap(),
        )]);

        assert_eq!(controller.check("f"), Verdict::Admit);
        assert_eq!(controller.check("f"), Verdict::Reject);

        clock.advance(10);
        assert_eq!(controller.check("f"), Verdict::Admit);
    }

    #[test]
    fn test_metrics_follow_verdicts() {
        let (controller, _) = setup(&[(
            "f",
            VirtualHostLimitConfig::fixed_window(3, 60).unwrap(),
        )]);
        for _ in 0..10 {
            controller.decide("f", 100);
        }

        let snapshot = controller.metrics().snapshot();
        assert_eq!(snapshot.requests_admitted, 3);
        assert_eq!(snapshot.requests_rejected, 7);
    }

    #[test]
    fn test_status_lists_enabled_hosts_sorted() {
        let (controller, _) = setup(&[
            ("zeta", VirtualHostLimitConfig::fixed_window(5, 30).unwrap()),
            ("alpha", VirtualHostLimitConfig::sliding_window(30).unwrap()),
            ("off", VirtualHostLimitConfig::default()),
        ]);

        let rows = controller.status(1_000);
        let hosts: Vec<_> = rows.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(hosts, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_status_does_not_advance_windows() {
        let (controller, _) = setup(&[(
            "f",
            VirtualHostLimitConfig::fixed_window(2, 10).unwrap(),
        )]);
        controller.decide("f", 0);
        controller.decide("f", 1);
        let before = controller.store().read("f").unwrap();

        // Window has elapsed: the row shows a fresh window but nothing is written
        let rows = controller.status(50);
        assert_eq!(
            rows[0].detail,
            ReportDetail::Fixed {
                limit: 2,
                current_count: 0,
                window_ends_at: 10,
                remaining: 0,
            }
        );
        assert_eq!(controller.store().read("f").unwrap(), before);
        assert_eq!(controller.status(50), rows);
    }

    #[test]
    fn test_concurrent_fixed_window_is_exact() {
        use std::thread;

        let (controller, _) = setup(&[(
            "busy",
            VirtualHostLimitConfig::fixed_window(50, 3_600).unwrap(),
        )]);
        let controller = Arc::new(controller);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let controller = Arc::clone(&controller);
                thread::spawn(move || {
                    (0..20)
                        .filter(|_| controller.decide("busy", 1_000).is_admit())
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
        assert_eq!(controller.store().read("busy").unwrap().state.total_count(), 200);
    }
}
