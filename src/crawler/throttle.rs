//! Politeness delay between network requests
//!
//! One throttle serves one site crawl. Cache hits never pass through it.
//! The interval is measured from the end of the previous request, so a slow
//! response never eats into the gap before the next one.

use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum interval, plus random jitter, between requests
#[derive(Debug)]
pub struct RequestThrottle {
    delay: Duration,
    jitter: Duration,
    /// When the previous request finished (or was sent, if not yet finished)
    last_request: Option<Instant>,
}

impl RequestThrottle {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self {
            delay,
            jitter,
            last_request: None,
        }
    }

    /// Creates a throttle from millisecond settings
    pub fn from_millis(delay_ms: u64, jitter_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms), Duration::from_millis(jitter_ms))
    }

    /// Returns true if the throttle never waits
    pub fn is_disabled(&self) -> bool {
        self.delay.is_zero() && self.jitter.is_zero()
    }

    /// Draws the interval to enforce before the next request
    pub fn next_interval(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        self.delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }

    /// Waits until the next request may be sent, then records it as sent
    pub async fn pause(&mut self) {
        if !self.is_disabled() {
            if let Some(last) = self.last_request {
                let ready_at = last + self.next_interval();
                let now = Instant::now();
                if ready_at > now {
                    tracing::trace!("Throttling for {:?}", ready_at - now);
                    tokio::time::sleep_until(ready_at).await;
                }
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Records that the request sent after the last `pause` has completed
    pub fn mark_done(&mut self) {
        self.last_request = Some(Instant::now());
    }
}
