//! Bounded retry policy for the REST transport.
//!
//! Retries are a transport concern: by the time a failure reaches the
//! aggregator it has already been retried here and becomes a truncated pass,
//! never an error.

use rand::Rng;
use tokio::time::Duration;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
            jitter_factor: 0.3,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff with jitter, clamped to `max_delay_ms`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64 * 2.0_f64.powi(attempt as i32);
        let clamped = base.min(self.max_delay_ms as f64);
        let jitter_range = clamped * self.jitter_factor;
        let jitter: f64 = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        Duration::from_millis((clamped + jitter).max(0.0) as u64)
    }
}

/// Statuses worth retrying: timeouts, throttling, upstream hiccups.
pub fn is_retryable_http_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// A request error is retryable when it is transient at the network level or
/// carries a retryable status.
pub fn is_retryable(err: &reqwest::Error) -> bool {
    if let Some(status) = err.status() {
        return is_retryable_http_status(status.as_u16());
    }
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_clamps() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 1000,
            jitter_factor: 0.0,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(1000));
    }

    #[test]
    fn retryable_status_classification() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(is_retryable_http_status(status), "{} should retry", status);
        }
        for status in [400, 401, 403, 404, 422] {
            assert!(!is_retryable_http_status(status), "{} should not retry", status);
        }
    }
}
