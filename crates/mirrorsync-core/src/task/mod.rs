//! Task model: one remote file under mirroring and its lifecycle.
//!
//! Status changes go through the transition methods in `transition`, which
//! reject moves the state machine does not allow. Only the scheduler calls them;
//! everyone else reads snapshots.

mod registry;
mod status;
mod transition;

pub use registry::{StatusCounts, TaskId, TaskRegistry};
pub use status::TaskStatus;
pub use transition::TransitionError;
pub(crate) use transition::VERIFY_SCALE;

use serde::{Deserialize, Serialize};

/// Progress of an in-flight task: bytes for downloads, a 0..=100 scale for verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: u64,
    /// Total if known (downloads without Content-Length have none).
    pub total: Option<u64>,
}

impl Progress {
    pub fn new(done: u64, total: Option<u64>) -> Self {
        Self { done, total }
    }
}

/// One remote file under mirroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    filename: String,
    remote_url: String,
    status: TaskStatus,
    attempts: u32,
    #[serde(skip)]
    progress: Option<Progress>,
}

impl Task {
    /// Present remotely, absent locally.
    pub fn pending(filename: impl Into<String>, remote_url: impl Into<String>) -> Self {
        Self::restore(filename, remote_url, TaskStatus::Pending, 0)
    }

    /// Present remotely and locally; verified before anything is downloaded.
    pub fn downloaded(filename: impl Into<String>, remote_url: impl Into<String>) -> Self {
        Self::restore(filename, remote_url, TaskStatus::Downloaded, 0)
    }

    /// Rebuild a task from persisted fields. In-flight statuses are settled.
    pub fn restore(
        filename: impl Into<String>,
        remote_url: impl Into<String>,
        status: TaskStatus,
        attempts: u32,
    ) -> Self {
        Self {
            filename: filename.into(),
            remote_url: remote_url.into(),
            status: status.settled(),
            attempts,
            progress: None,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Failed download attempts so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Present only while downloading or verifying.
    pub fn progress(&self) -> Option<Progress> {
        self.progress
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
