//! User-visible pipeline events.

use std::fmt;

use crate::retry::ErrorKind;
use crate::task::TaskRegistry;

/// Something the user should hear about. Every notice is also logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    RetryScheduled {
        filename: String,
        attempt: u32,
        max_attempts: u32,
        kind: ErrorKind,
        error: String,
    },
    DownloadFailed {
        filename: String,
        attempts: u32,
        error: String,
    },
    /// Local hash or expected hash could not be obtained.
    VerifyUnavailable { filename: String, error: String },
    HashMismatch {
        filename: String,
        expected: String,
        actual: String,
    },
    Verified { filename: String },
    /// A further pass starts with `count` files bounced back by verification.
    RedownloadPass { pass: u32, count: usize },
    /// Still queued for download when the pass limit was reached.
    NotConverged { filename: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::RetryScheduled {
                filename,
                attempt,
                max_attempts,
                kind,
                error,
            } => write!(
                f,
                "download of {} failed ({}: {}), retry {}/{}",
                filename, kind, error, attempt, max_attempts
            ),
            Notice::DownloadFailed {
                filename,
                attempts,
                error,
            } => write!(
                f,
                "giving up on {} after {} attempts: {}",
                filename, attempts, error
            ),
            Notice::VerifyUnavailable { filename, error } => {
                write!(f, "could not verify {}: {}", filename, error)
            }
            Notice::HashMismatch {
                filename,
                expected,
                actual,
            } => write!(
                f,
                "hash mismatch for {} (expected {}, got {}), re-downloading",
                filename, expected, actual
            ),
            Notice::Verified { filename } => write!(f, "verified {}", filename),
            Notice::RedownloadPass { pass, count } => {
                write!(f, "pass {}: re-downloading {} file(s)", pass, count)
            }
            Notice::NotConverged { filename } => {
                write!(f, "{} did not verify after repeated downloads", filename)
            }
        }
    }
}

/// Receives notices and throttled progress ticks from the driver loop.
pub trait PipelineObserver {
    fn notice(&mut self, notice: &Notice);

    /// Called at most once per progress interval with the current registry.
    fn tick(&mut self, _registry: &TaskRegistry) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn notice(&mut self, _notice: &Notice) {}
}
