//! Status throttling.
//!
//! Rate-limits progress reports so a fast transfer does not flood whoever
//! displays them.

use std::time::{Duration, Instant};

use super::DEFAULT_STATUS_INTERVAL;

/// Rate-limiter for progress reports.
#[derive(Debug, Clone)]
pub struct StatusThrottle {
    last_emit: Instant,
    min_interval: Duration,
}

impl StatusThrottle {
    /// Create a throttle whose interval starts counting at `now`.
    pub fn new(min_interval: Duration, now: Instant) -> Self {
        Self {
            last_emit: now,
            min_interval,
        }
    }

    /// Create a throttle with the default 500ms interval.
    pub fn with_default_interval(now: Instant) -> Self {
        Self::new(DEFAULT_STATUS_INTERVAL, now)
    }

    /// Check if strictly more than the interval has passed since the last
    /// report, and if so start a new interval at `now`.
    pub fn should_emit(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_emit) > self.min_interval {
            self.last_emit = now;
            true
        } else {
            false
        }
    }

    /// The configured minimum interval.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_blocks_within_interval() {
        let start = Instant::now();
        let mut throttle = StatusThrottle::with_default_interval(start);

        assert!(!throttle.should_emit(start));
        assert!(!throttle.should_emit(start + Duration::from_millis(500)));
    }

    #[test]
    fn test_throttle_emits_after_interval() {
        let start = Instant::now();
        let mut throttle = StatusThrottle::new(Duration::from_millis(100), start);

        assert!(throttle.should_emit(start + Duration::from_millis(101)));
        // Interval restarts from the emission.
        assert!(!throttle.should_emit(start + Duration::from_millis(150)));
        assert!(throttle.should_emit(start + Duration::from_millis(250)));
    }

    #[test]
    fn test_throttle_ignores_time_going_backwards() {
        let start = Instant::now();
        let mut throttle = StatusThrottle::new(Duration::from_millis(100), start + Duration::from_secs(1));
        assert!(!throttle.should_emit(start));
    }
}
