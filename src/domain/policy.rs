//! Admission decision rules.
//!
//! Pure functions from the result of a window advance to a [`Verdict`].
//! They hold no state; the controller feeds them what the window store
//! returned.

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Process the request normally
    Admit,
    /// Refuse the request with a service-unavailable response
    Reject,
}

impl Verdict {
    /// Check if this verdict is Admit.
    pub fn is_admit(&self) -> bool {
        matches!(self, Verdict::Admit)
    }

    /// Check if this verdict is Reject.
    pub fn is_reject(&self) -> bool {
        matches!(self, Verdict::Reject)
    }
}

/// Sliding-window rule.
///
/// `evicted` is the timestamp of the admission made
/// [`SLIDING_WINDOW_DEPTH`](crate::domain::window::SLIDING_WINDOW_DEPTH)
/// calls ago. Rejects when that admission is at most `window_seconds` old.
/// `None` (slot never filled) is infinitely old, so a fresh ring always
/// admits.
///
/// # Example
/// ```
/// use vhost_throttle::{sliding_window_verdict, Verdict};
///
/// assert_eq!(sliding_window_verdict(5, None, 10), Verdict::Admit);
/// assert_eq!(sliding_window_verdict(105, Some(100), 10), Verdict::Reject);
/// assert_eq!(sliding_window_verdict(115, Some(100), 10), Verdict::Admit);
/// ```
pub fn sliding_window_verdict(now: u64, evicted: Option<u64>, window_seconds: u64) -> Verdict {
    match evicted {
        Some(at) if now.saturating_sub(at) <= window_seconds => Verdict::Reject,
        _ => Verdict::Admit,
    }
}

/// Fixed-window rule: reject once the post-increment count exceeds the cap.
///
/// # Example
/// ```
/// use vhost_throttle::{fixed_window_verdict, Verdict};
///
/// assert_eq!(fixed_window_verdict(2, 2), Verdict::Admit);
/// assert_eq!(fixed_window_verdict(3, 2), Verdict::Reject);
/// ```
pub fn fixed_window_verdict(count: u64, max_connections: u64) -> Verdict {
    if count > max_connections {
        Verdict::Reject
    } else {
        Verdict::Admit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_predicates() {
        assert!(Verdict::Admit.is_admit());
        assert!(!Verdict::Admit.is_reject());
        assert!(Verdict::Reject.is_reject());
    }

    #[test]
    fn test_sliding_unfilled_slot_admits() {
        assert_eq!(sliding_window_verdict(3, None, 10), Verdict::Admit);
        assert_eq!(sliding_window_verdict(0, None, 10), Verdict::Admit);
    }

    #[test]
    fn test_sliding_admission_at_epoch_zero_counts() {
        assert_eq!(sliding_window_verdict(5, Some(0), 10), Verdict::Reject);
        assert_eq!(sliding_window_verdict(15, Some(0), 10), Verdict::Admit);
    }

    #[test]
    fn test_sliding_boundary_is_inclusive() {
        assert_eq!(sliding_window_verdict(110, Some(100), 10), Verdict::Reject);
        assert_eq!(sliding_window_verdict(111, Some(100), 10), Verdict::Admit);
    }

    #[test]
    fn test_sliding_clock_went_backwards() {
        // Age clamps to zero, which is within any window
        assert_eq!(sliding_window_verdict(90, Some(100), 1), Verdict::Reject);
    }

    #[test]
    fn test_fixed_zero_limit_rejects_everything() {
        assert_eq!(fixed_window_verdict(1, 0), Verdict::Reject);
    }

    #[test]
    fn test_fixed_limit_edges() {
        assert_eq!(fixed_window_verdict(1, 1), Verdict::Admit);
        assert_eq!(fixed_window_verdict(2, 1), Verdict::Reject);
        assert_eq!(fixed_window_verdict(100, 100), Verdict::Admit);
        assert_eq!(fixed_window_verdict(101, 100), Verdict::Reject);
    }
}
