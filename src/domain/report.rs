//! Status rows derived from host snapshots.
//!
//! A [`HostReport`] is what the status page shows for one host. It is
//! computed from a [`WindowSnapshot`] and the current time only, so building
//! one never advances a window.

use crate::domain::config::Strategy;
use crate::domain::host::HostId;
use crate::domain::window::{WindowSnapshot, WindowState};

/// Strategy-specific part of a status row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDetail {
    /// Sliding-window host
    Sliding {
        /// Configured accounting period in seconds
        update_period: u64,
        /// Age of the oldest remembered admission; `None` until the ring
        /// has been filled once
        oldest_age: Option<u64>,
    },
    /// Fixed-window host
    Fixed {
        /// Configured capacity per window
        limit: u64,
        /// Requests counted in the live window (0 once it has elapsed)
        current_count: u64,
        /// Timestamp at which the window resets
        window_ends_at: u64,
        /// Seconds left in the window
        remaining: u64,
    },
}

/// One status row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostReport {
    /// The host
    pub host: HostId,
    /// Lifetime number of counted requests
    pub total_count: u64,
    /// Strategy-specific fields
    pub detail: ReportDetail,
}

impl HostReport {
    /// Build a row from a snapshot taken at or before `now`.
    pub fn from_snapshot(host: HostId, snapshot: &WindowSnapshot, now: u64) -> Self {
        let detail = match &snapshot.state {
            WindowState::Sliding(ring) => ReportDetail::Sliding {
                update_period: snapshot.config.window_seconds(),
                oldest_age: ring.oldest_age(now),
            },
            WindowState::Fixed(window) => ReportDetail::Fixed {
                limit: snapshot.config.max_connections(),
                current_count: window.effective_count(now),
                window_ends_at: window.window_ends_at(),
                remaining: window.remaining(now),
            },
        };

        Self {
            host,
            total_count: snapshot.state.total_count(),
            detail,
        }
    }

    /// Strategy of the reported host.
    pub fn strategy(&self) -> Strategy {
        match self.detail {
            ReportDetail::Sliding { .. } => Strategy::SlidingWindow,
            ReportDetail::Fixed { .. } => Strategy::FixedWindow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::VirtualHostLimitConfig;
    use crate::domain::window::{FixedWindowState, SlidingWindowState, SLIDING_WINDOW_DEPTH};

    fn fixed_snapshot(limit: u64, window: u64, hits: &[u64]) -> WindowSnapshot {
        let mut state = FixedWindowState::new();
        for &t in hits {
            state.advance(t, window);
        }
        WindowSnapshot {
            config: VirtualHostLimitConfig::fixed_window(limit, window).unwrap(),
            state: WindowState::Fixed(state),
        }
    }

    #[test]
    fn test_fixed_report_live_window() {
        let snapshot = fixed_snapshot(5, 30, &[100, 101, 102]);
        let report = HostReport::from_snapshot(HostId::new("a.example"), &snapshot, 110);

        assert_eq!(report.total_count, 3);
        assert_eq!(report.strategy(), Strategy::FixedWindow);
        assert_eq!(
            report.detail,
            ReportDetail::Fixed {
                limit: 5,
                current_count: 3,
                window_ends_at: 130,
                remaining: 20,
            }
        );
    }

    #[test]
    fn test_fixed_report_elapsed_window() {
        let snapshot = fixed_snapshot(5, 30, &[100, 101]);
        let report = HostReport::from_snapshot(HostId::new("a.example"), &snapshot, 200);

        assert_eq!(
            report.detail,
            ReportDetail::Fixed {
                limit: 5,
                current_count: 0,
                window_ends_at: 130,
                remaining: 0,
            }
        );
        // Snapshot itself untouched
        match snapshot.state {
            WindowState::Fixed(ref s) => assert_eq!(s.current_count(), 2),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_sliding_report() {
        let mut ring = SlidingWindowState::new();
        let snapshot_of = |ring: &SlidingWindowState| WindowSnapshot {
            config: VirtualHostLimitConfig::sliding_window(10).unwrap(),
            state: WindowState::Sliding(ring.clone()),
        };

        let report = HostReport::from_snapshot(HostId::new("s.example"), &snapshot_of(&ring), 50);
        assert_eq!(
            report.detail,
            ReportDetail::Sliding {
                update_period: 10,
                oldest_age: None,
            }
        );

        for _ in 0..SLIDING_WINDOW_DEPTH {
            ring.advance(40);
        }
        let report = HostReport::from_snapshot(HostId::new("s.example"), &snapshot_of(&ring), 50);
        assert_eq!(report.total_count, 64);
        assert_eq!(
            report.detail,
            ReportDetail::Sliding {
                update_period: 10,
                oldest_age: Some(10),
            }
        );
    }
}
