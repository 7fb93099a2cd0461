//! Deadline tracking for the bounded-timeout polling loops.

use std::thread;
use std::time::{Duration, Instant};

/// Sleep between read polls while waiting for module output.
pub const READ_POLL: Duration = Duration::from_millis(10);
/// Sleep between write retries when the driver reports would-block.
pub const WRITE_POLL: Duration = Duration::from_millis(1);

/// Tracks a deadline for a single protocol operation.
///
/// Every loop that talks to a device handle is bounded by one of these;
/// nothing in the workspace polls without a deadline.
#[derive(Clone, Copy, Debug)]
pub struct PollTimer {
    deadline: Instant,
}

impl PollTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    /// Returns `true` once the deadline has passed.
    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Time left before the deadline, zero if already past it.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Sleeps for `interval`, clamped so the deadline is not overshot by
    /// more than one interval.
    pub fn sleep(&self, interval: Duration) {
        let nap = interval.min(self.remaining());
        if !nap.is_zero() {
            thread::sleep(nap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_timeout() {
        let t = PollTimer::new(Duration::from_millis(20));
        assert!(!t.expired());
        thread::sleep(Duration::from_millis(30));
        assert!(t.expired());
        assert_eq!(t.remaining(), Duration::ZERO);
    }

    #[test]
    fn zero_timeout_is_immediately_expired() {
        let t = PollTimer::new(Duration::ZERO);
        assert!(t.expired());
    }
}
