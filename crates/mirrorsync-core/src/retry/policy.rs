use std::fmt;

/// Failed download attempts allowed per file before it is marked failed.
pub const MAX_RETRIES: u32 = 3;

/// High-level classification of a transfer error.
///
/// Every kind is retried the same way; the kind only shows up in notices and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/low-speed).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, short body, etc.).
    Connection,
    /// HTTP 5xx other than throttling.
    Http5xx(u16),
    /// Local disk failure while writing the file.
    Storage,
    /// Anything else (4xx, malformed URL, ...).
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Timeout => f.write_str("timeout"),
            ErrorKind::Throttled => f.write_str("throttled"),
            ErrorKind::Connection => f.write_str("connection"),
            ErrorKind::Http5xx(code) => write!(f, "http {}", code),
            ErrorKind::Storage => f.write_str("storage"),
            ErrorKind::Other => f.write_str("other"),
        }
    }
}

/// Decision returned by the retry policy after a failed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Put the file back at the end of the download queue.
    Requeue,
    /// Give up; the file is marked failed.
    NoRetry,
}

/// Attempt-capped retry policy. Retries go to the back of the queue with no delay:
/// failures are assumed to be transient and network-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of failed attempts (including the first).
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// `failed_attempts` counts the failure being decided on (1 = first failure).
    pub fn decide(&self, failed_attempts: u32) -> RetryDecision {
        if failed_attempts < self.max_attempts {
            RetryDecision::Requeue
        } else {
            RetryDecision::NoRetry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_max_attempts() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1), RetryDecision::Requeue);
        assert_eq!(p.decide(2), RetryDecision::Requeue);
        assert_eq!(p.decide(3), RetryDecision::NoRetry);
        assert_eq!(p.decide(4), RetryDecision::NoRetry);
    }

    #[test]
    fn single_attempt_policy_never_requeues() {
        let p = RetryPolicy::new(0);
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.decide(1), RetryDecision::NoRetry);
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Http5xx(502).to_string(), "http 502");
        assert_eq!(ErrorKind::Throttled.to_string(), "throttled");
    }
}
