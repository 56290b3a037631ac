//! Collaborators the pipeline is generic over.
//!
//! Futures returned here are polled on the driver task and need not be `Send`;
//! implementations offload blocking work to `spawn_blocking` themselves.

use std::future::Future;
use std::path::Path;

use crate::oracle::OracleError;
use crate::retry::TransferError;
use crate::task::Task;

use super::progress::ProgressReporter;

/// Fetches one remote file into `dest`, replacing whatever is there.
pub trait TransferEngine {
    /// Returns the number of bytes written. Progress goes through `progress`
    /// as cumulative bytes plus the expected total when the server announces it.
    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: ProgressReporter,
    ) -> impl Future<Output = Result<u64, TransferError>>;
}

/// Computes the content hash of a local file as lowercase hex.
pub trait HashEngine {
    fn hash(&self, path: &Path) -> impl Future<Output = anyhow::Result<String>>;
}

/// Source of the authoritative hash for a remote file.
pub trait ChecksumOracle {
    fn expected_hash(
        &self,
        filename: &str,
        remote_url: &str,
    ) -> impl Future<Output = Result<String, OracleError>>;
}

/// Receives a full snapshot of the task list after every transition.
pub trait PersistenceSink {
    fn save(&self, tasks: &[Task]) -> impl Future<Output = anyhow::Result<()>>;

    /// Last saved snapshot, in saved order; empty if nothing was saved yet.
    fn load(&self) -> impl Future<Output = anyhow::Result<Vec<Task>>>;
}
