//! Retransmission timer
//!
//! A single-shot deadline on a monotonic clock. The sender arms it when the
//! window goes from empty to non-empty, rearms it on every accepted
//! acknowledgment, and clears it once the window drains. Expiry is observed
//! by polling at the top of each main-loop iteration; there are no callbacks.

use std::time::{Duration, Instant};

/// Single deadline tracking the age of the oldest unacknowledged segment
#[derive(Debug)]
pub struct RetransmitTimer {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl RetransmitTimer {
    /// Create an idle timer with the given timeout interval
    pub fn new(timeout: Duration) -> Self {
        RetransmitTimer {
            timeout,
            deadline: None,
        }
    }

    /// The configured timeout interval
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Arm (or rearm) the timer: the deadline becomes now + timeout
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.timeout);
    }

    /// Return the timer to idle
    pub fn clear(&mut self) {
        self.deadline = None;
    }

    /// `true` while a deadline is pending
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// `true` once the armed deadline has passed; an idle timer never expires
    pub fn expired(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Time remaining until the deadline, or `None` when idle
    ///
    /// Returns `Duration::ZERO` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}
