//! Retry policy for failed transfers.
//!
//! Classifies transfer errors (timeouts, throttling, connection failures,
//! storage) for reporting, and decides whether a failed download goes back
//! into the queue or is given up on.

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::TransferError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy, MAX_RETRIES};
