use std::time::Duration;

/// URL-load retry budget. `max_retries` counts retries after the first
/// attempt, so a request is tried at most `max_retries + 1` times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }
}

/// HTTP statuses that are usually transient on GitHub: 403 (secondary rate
/// limits), 502 and 503.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 403 | 502 | 503)
}

/// Dropped or refused connections are worth another try; anything else a
/// transport error reports (TLS, decoding, redirects) will fail the same way.
pub fn is_retryable_transport(err: &reqwest::Error) -> bool {
    err.is_connect() || (err.is_request() && !err.is_timeout())
}
