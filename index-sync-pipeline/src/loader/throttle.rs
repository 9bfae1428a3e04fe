//! Pacing between physical bulk requests.

use std::time::Duration;

/// Decides how long to wait before each physical bulk request.
///
/// The first request goes out immediately; every later one waits the
/// configured interval. A zero interval disables waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkThrottle {
    interval: Duration,
    sent: usize,
}

impl BulkThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, sent: 0 }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of requests the throttle has been asked about.
    pub fn requests(&self) -> usize {
        self.sent
    }

    /// Wait to apply before the next request, counting that request as sent.
    pub fn next_wait(&mut self) -> Duration {
        let wait = if self.sent == 0 {
            Duration::ZERO
        } else {
            self.interval
        };
        self.sent += 1;
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_is_not_delayed() {
        let mut throttle = BulkThrottle::new(Duration::from_millis(250));
        assert_eq!(throttle.next_wait(), Duration::ZERO);
        assert_eq!(throttle.next_wait(), Duration::from_millis(250));
        assert_eq!(throttle.next_wait(), Duration::from_millis(250));
        assert_eq!(throttle.requests(), 3);
    }

    #[test]
    fn test_zero_interval_never_waits() {
        let mut throttle = BulkThrottle::new(Duration::ZERO);
        assert!((0..5).all(|_| throttle.next_wait().is_zero()));
    }
}
