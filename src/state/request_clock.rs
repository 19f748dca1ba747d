use std::time::Duration;
use tokio::time::Instant;

/// Tracks outbound requests against one origin
///
/// Holds the request count and the time of the last request so callers can space
/// requests by a minimum interval.
#[derive(Debug, Clone)]
pub struct RequestClock {
    /// Number of requests made in the current run
    pub request_count: u64,

    /// Timestamp of the last request
    pub last_request_time: Option<Instant>,

    /// Minimum spacing between two requests
    pub min_interval: Duration,
}

impl RequestClock {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            request_count: 0,
            last_request_time: None,
            min_interval,
        }
    }

    /// Checks if a request can be made now
    pub fn can_request(&self, now: Instant) -> bool {
        self.time_until_next_request(now).is_none()
    }

    /// Records that a request was made
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_interval {
            Some(self.min_interval - elapsed)
        } else {
            None
        }
    }
}

impl Default for RequestClock {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}
