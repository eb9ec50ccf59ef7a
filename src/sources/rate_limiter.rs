// Request pacing for API sources.
//
// Reddit's OAuth API allows roughly 100 requests per minute per client, and
// a paged search fires several requests back to back. Callers book slots on
// a shared schedule: each booking takes the earliest free slot and pushes
// the next one `interval` later, then sleeps until its own slot with the
// lock released. However many fetches run at once, their requests go out
// one `interval` apart.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

/// Books evenly spaced request slots.
#[derive(Clone)]
pub struct RateLimiter {
    interval: Duration,
    /// Earliest instant the next request may go out; None until first use
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Allow at most `requests_per_second` requests per second. A
    /// non-positive rate disables pacing.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            interval,
            next_slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for this caller's slot.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next.map_or(now, |at| at.max(now));
            *next = Some(slot + self.interval);
            slot
        };
        sleep_until(slot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_is_immediate() {
        let limiter = RateLimiter::new(1.0);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn idle_limiter_does_not_bank_slots() {
        let limiter = RateLimiter::new(10.0); // 100ms spacing
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        // Time spent idle doesn't turn into a burst allowance
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn concurrent_callers_are_spaced_one_interval_apart() {
        let limiter = RateLimiter::new(4.0); // 250ms spacing
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.acquire().await;
                    start.elapsed()
                })
            })
            .collect();

        let mut released = Vec::new();
        for handle in handles {
            released.push(handle.await.unwrap());
        }
        released.sort();

        for pair in released.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                gap >= Duration::from_millis(200),
                "Callers released {:?} apart: {:?}",
                gap,
                released
            );
        }
        assert!(released[3] >= Duration::from_millis(700));
    }

    #[test]
    fn zero_rate_means_no_pacing() {
        assert_eq!(RateLimiter::new(0.0).interval(), Duration::ZERO);
    }
}
