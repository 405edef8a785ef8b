//! Per-host accounting state for both limiting strategies.
//!
//! These types only do bookkeeping. Whether a given advance means admit or
//! reject is decided by the controller (see `domain::policy`).
//!
//! Timestamps are whole seconds since the Unix epoch.

use crate::domain::config::{Strategy, VirtualHostLimitConfig};

/// Number of admissions remembered by the sliding-window ring.
///
/// This is a fixed property of the sliding-window strategy, not a tunable:
/// its effective limit is `SLIDING_WINDOW_DEPTH / window_seconds`, whatever
/// `max_connections` says.
pub const SLIDING_WINDOW_DEPTH: usize = 64;

/// Ring of the last [`SLIDING_WINDOW_DEPTH`] admission timestamps.
///
/// The slot at `cursor` is the oldest remembered admission, the one the next
/// advance evicts. Slots that were never written hold `None`, which reads as
/// infinitely far in the past.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindowState {
    ring: [Option<u64>; SLIDING_WINDOW_DEPTH],
    cursor: usize,
    total_count: u64,
}

impl SlidingWindowState {
    /// Empty history: every slot unfilled, cursor at 0.
    pub fn new() -> Self {
        Self {
            ring: [None; SLIDING_WINDOW_DEPTH],
            cursor: 0,
            total_count: 0,
        }
    }

    /// Record an admission attempt at `now`.
    ///
    /// Overwrites the slot at the cursor with `now`, moves the cursor one
    /// slot forward and returns the timestamp that was overwritten, i.e. the
    /// attempt made [`SLIDING_WINDOW_DEPTH`] calls ago (`None` for the first
    /// [`SLIDING_WINDOW_DEPTH`] calls).
    pub fn advance(&mut self, now: u64) -> Option<u64> {
        let evicted = self.ring[self.cursor].replace(now);
        self.cursor = (self.cursor + 1) % SLIDING_WINDOW_DEPTH;
        self.total_count = self.total_count.saturating_add(1);
        evicted
    }

    /// Index of the next slot to overwrite.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Timestamp of the oldest remembered admission, if that slot was filled.
    pub fn oldest(&self) -> Option<u64> {
        self.ring[self.cursor]
    }

    /// Age of the oldest remembered admission, `None` while the ring has
    /// not wrapped yet.
    pub fn oldest_age(&self, now: u64) -> Option<u64> {
        self.oldest().map(|at| now.saturating_sub(at))
    }

    /// All slots, starting at index 0.
    pub fn slots(&self) -> &[Option<u64>; SLIDING_WINDOW_DEPTH] {
        &self.ring
    }

    /// Lifetime number of counted requests.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}

impl Default for SlidingWindowState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of advancing a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAdvance {
    /// Count in the current window, including this call
    pub count: u64,
    /// Whether this call started a new window
    pub window_reset: bool,
}

/// Counter that resets in bulk at fixed window boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixedWindowState {
    window_ends_at: u64,
    current_count: u64,
    total_count: u64,
}

impl FixedWindowState {
    /// Fresh state. The window end starts at 0, so the first advance opens
    /// a window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request at `now`.
    ///
    /// When `now >= window_ends_at` the current count drops to 0 and the
    /// window moves to end at `now + window_seconds` before counting.
    pub fn advance(&mut self, now: u64, window_seconds: u64) -> FixedAdvance {
        let window_reset = now >= self.window_ends_at;
        if window_reset {
            self.current_count = 0;
            self.window_ends_at = now.saturating_add(window_seconds);
        }
        self.current_count = self.current_count.saturating_add(1);
        self.total_count = self.total_count.saturating_add(1);

        FixedAdvance {
            count: self.current_count,
            window_reset,
        }
    }

    /// Timestamp at which the current window resets.
    pub fn window_ends_at(&self) -> u64 {
        self.window_ends_at
    }

    /// Requests counted in the current window, as stored.
    pub fn current_count(&self) -> u64 {
        self.current_count
    }

    /// Count the next advance at `now` would start from. Zero once the
    /// window has elapsed, without touching the stored value.
    pub fn effective_count(&self, now: u64) -> u64 {
        if now >= self.window_ends_at {
            0
        } else {
            self.current_count
        }
    }

    /// Seconds until the window resets, 0 if it already has.
    pub fn remaining(&self, now: u64) -> u64 {
        self.window_ends_at.saturating_sub(now)
    }

    /// Lifetime number of counted requests. Never reset.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}

/// Accounting state of one host, matching its strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowState {
    /// Sliding-window ring
    Sliding(SlidingWindowState),
    /// Fixed-window counter
    Fixed(FixedWindowState),
}

impl WindowState {
    /// Zero-initialized state for a strategy.
    pub fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::SlidingWindow => WindowState::Sliding(SlidingWindowState::new()),
            Strategy::FixedWindow => WindowState::Fixed(FixedWindowState::new()),
        }
    }

    /// Strategy this state belongs to.
    pub fn strategy(&self) -> Strategy {
        match self {
            WindowState::Sliding(_) => Strategy::SlidingWindow,
            WindowState::Fixed(_) => Strategy::FixedWindow,
        }
    }

    /// Lifetime number of counted requests.
    pub fn total_count(&self) -> u64 {
        match self {
            WindowState::Sliding(s) => s.total_count(),
            WindowState::Fixed(s) => s.total_count(),
        }
    }
}

/// Point-in-time copy of one host's configuration and counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Configuration the host was registered with
    pub config: VirtualHostLimitConfig,
    /// Copy of the accounting state
    pub state: WindowState,
}
