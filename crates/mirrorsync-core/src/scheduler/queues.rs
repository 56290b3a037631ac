//! Driver-owned work queues.

use std::collections::VecDeque;

use crate::task::{TaskId, TaskRegistry, TaskStatus};

/// To-download and to-verify queues. A task id is in at most one queue, and
/// never in a queue while a worker owns it.
#[derive(Debug, Default)]
pub struct WorkQueues {
    download: VecDeque<TaskId>,
    verify: VecDeque<TaskId>,
}

impl WorkQueues {
    /// `Pending` tasks to download and `Downloaded` tasks to verify, in registry order.
    pub fn seed(registry: &TaskRegistry) -> Self {
        Self {
            download: registry.ids_with_status(TaskStatus::Pending).collect(),
            verify: registry.ids_with_status(TaskStatus::Downloaded).collect(),
        }
    }

    /// New or retried download.
    pub fn push_download_back(&mut self, id: TaskId) {
        debug_assert!(!self.contains(id));
        self.download.push_back(id);
    }

    /// Download after a failed verification, ahead of everything else.
    pub fn push_download_front(&mut self, id: TaskId) {
        debug_assert!(!self.contains(id));
        self.download.push_front(id);
    }

    pub fn push_verify(&mut self, id: TaskId) {
        debug_assert!(!self.contains(id));
        self.verify.push_back(id);
    }

    pub fn pop_download(&mut self) -> Option<TaskId> {
        self.download.pop_front()
    }

    pub fn pop_verify(&mut self) -> Option<TaskId> {
        self.verify.pop_front()
    }

    pub fn download_len(&self) -> usize {
        self.download.len()
    }

    pub fn verify_len(&self) -> usize {
        self.verify.len()
    }

    /// Drain the download queue, front first.
    pub fn drain_download(&mut self) -> Vec<TaskId> {
        self.download.drain(..).collect()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.download.contains(&id) || self.verify.contains(&id)
    }
}
