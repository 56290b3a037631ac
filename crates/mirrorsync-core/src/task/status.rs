//! Task lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of one mirrored file, stored as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Downloading,
    Downloaded,
    Verifying,
    Verified,
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Pending,
        TaskStatus::Downloading,
        TaskStatus::Downloaded,
        TaskStatus::Verifying,
        TaskStatus::Verified,
        TaskStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Downloaded => "downloaded",
            TaskStatus::Verifying => "verifying",
            TaskStatus::Verified => "verified",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        TaskStatus::ALL.into_iter().find(|st| st.as_str() == s)
    }

    /// `Verified` and `Failed` are never re-queued.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Verified | TaskStatus::Failed)
    }

    /// A worker currently owns the task.
    pub fn is_in_flight(self) -> bool {
        matches!(self, TaskStatus::Downloading | TaskStatus::Verifying)
    }

    /// Status to resume from when a snapshot was taken mid-flight: an interrupted
    /// download starts over, an interrupted verification is redone.
    pub fn settled(self) -> Self {
        match self {
            TaskStatus::Downloading => TaskStatus::Pending,
            TaskStatus::Verifying => TaskStatus::Downloaded,
            other => other,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
