//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Mock clock for testing.
///
/// Allows tests to control time progression explicitly, enabling deterministic
/// testing of window rollover.
///
/// # Examples
///
/// ```
/// use vhost_throttle::infrastructure::mocks::MockClock;
/// use vhost_throttle::application::ports::Clock;
///
/// let clock = MockClock::new(1_000);
/// assert_eq!(clock.now(), 1_000);
///
/// clock.advance(30);
/// assert_eq!(clock.now(), 1_030);
///
/// clock.set(5);
/// assert_eq!(clock.now(), 5);
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying time value, so advancing time in
/// one clone affects all clones.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<AtomicU64>,
}

impl MockClock {
    /// Create a mock clock reading `start` seconds since the epoch.
    pub fn new(start: u64) -> Self {
        Self {
            current: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Advance the clock by `seconds`.
    pub fn advance(&self, seconds: u64) {
        self.current.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Set the clock to a specific time.
    pub fn set(&self, now: u64) {
        self.current.store(now, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}
