//! Download/verify pipeline.
//!
//! Two bounded worker pools share one task registry: the download pool moves
//! `Pending` tasks to `Downloaded`, the verify pool moves `Downloaded` tasks to
//! `Verified` or bounces them back to the front of the download queue. Both pools
//! are futures polled by a single driver loop, which owns the registry and the
//! queues and applies every transition. Passes repeat while the download queue
//! is non-empty.

mod engines;
mod notice;
mod pass;
mod pipeline;
mod progress;
mod queues;
mod summary;


pub use engines::{ChecksumOracle, HashEngine, PersistenceSink, TransferEngine};
pub use notice::{NoopObserver, Notice, PipelineObserver};
pub use pipeline::{Pipeline, PipelineOptions, DEFAULT_MAX_PASSES};
pub use progress::{ProgressEvent, ProgressReporter, Throttle};
pub use queues::WorkQueues;
pub use summary::RunSummary;

/// Concurrent transfers per pass.
pub const DOWNLOAD_CONCURRENCY: usize = 10;
/// Concurrent verifications per pass.
pub const VERIFY_CONCURRENCY: usize = 5;
