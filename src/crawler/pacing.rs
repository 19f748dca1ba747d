//! Request gating and pacing
//!
//! Every page load goes through one shared [`RequestGate`], which spaces loads by a
//! minimum interval no matter how many workers are running. Entry and key pacing are
//! cancellable sleeps.

use crate::state::RequestClock;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Shared gate enforcing a minimum interval between outbound page loads
#[derive(Debug)]
pub struct RequestGate {
    clock: Mutex<RequestClock>,
}

impl RequestGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            clock: Mutex::new(RequestClock::new(min_interval)),
        }
    }

    /// Gate that never waits
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Waits until a request may be made, then records it
    ///
    /// Waiters are served in arrival order; the lock is held while sleeping so the
    /// next waiter measures its interval from this request.
    pub async fn wait_turn(&self) {
        let mut clock = self.clock.lock().await;
        if let Some(wait) = clock.time_until_next_request(Instant::now()) {
            tracing::trace!("Request gate: waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        clock.record_request(Instant::now());
    }

    /// Number of requests let through so far
    pub async fn requests_made(&self) -> u64 {
        self.clock.lock().await.request_count
    }
}

/// Sleeps for `duration` unless cancelled first
///
/// Returns false if the token was cancelled before or during the wait.
pub async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_gate_spaces_requests() {
        let gate = RequestGate::new(Duration::from_secs(1));
        let started = Instant::now();

        gate.wait_turn().await;
        gate.wait_turn().await;
        gate.wait_turn().await;

        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(gate.requests_made().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_shared_across_tasks() {
        let gate = Arc::new(RequestGate::new(Duration::from_millis(500)));
        let started = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.wait_turn().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlimited_gate_never_waits() {
        let gate = RequestGate::unlimited();
        let started = Instant::now();

        for _ in 0..10 {
            gate.wait_turn().await;
        }

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_completes() {
        let token = CancellationToken::new();
        let started = Instant::now();

        assert!(pause(Duration::from_secs(2), &token).await);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_interrupted() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        assert!(!pause(Duration::from_secs(60), &token).await);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_pause_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(!pause(Duration::ZERO, &token).await);
    }
}
