//! Transfer error type for retry classification.

use thiserror::Error;

/// Error returned by a single file transfer (curl failure, HTTP error, or storage failure).
/// Kept concrete so failures can be classified before they are reported.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Transfer completed but fewer bytes arrived than Content-Length announced.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Disk/storage write failed (e.g. disk full, permission denied).
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// The blocking worker running the transfer panicked or was cancelled.
    #[error("transfer worker: {0}")]
    Worker(String),
}
