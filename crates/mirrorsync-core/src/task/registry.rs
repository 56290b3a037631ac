//! In-memory task registry for one run.

use std::collections::HashMap;

use super::{Task, TaskStatus};

/// Index of a task inside its registry.
pub type TaskId = usize;

/// Per-status task counts for summaries and progress lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub downloading: usize,
    pub downloaded: usize,
    pub verifying: usize,
    pub verified: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending
            + self.downloading
            + self.downloaded
            + self.verifying
            + self.verified
            + self.failed
    }
}

/// All tasks of a run, in reconciliation order. Tasks are addressed by [`TaskId`];
/// filenames are unique.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    by_name: HashMap<String, TaskId>,
}

impl TaskRegistry {
    /// Build from a task list. A repeated filename keeps its first entry.
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut registry = TaskRegistry::default();
        for task in tasks {
            if registry.by_name.contains_key(task.filename()) {
                tracing::warn!(filename = %task.filename(), "duplicate task ignored");
                continue;
            }
            registry
                .by_name
                .insert(task.filename().to_string(), registry.tasks.len());
            registry.tasks.push(task);
        }
        registry
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub fn id_of(&self, filename: &str) -> Option<TaskId> {
        self.by_name.get(filename).copied()
    }

    pub fn find(&self, filename: &str) -> Option<&Task> {
        self.id_of(filename).and_then(|id| self.get(id))
    }

    /// Ids of tasks in `status`, in registry order.
    pub fn ids_with_status(&self, status: TaskStatus) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.status() == status)
            .map(|(id, _)| id)
    }

    pub fn counts(&self) -> StatusCounts {
        let mut c = StatusCounts::default();
        for t in &self.tasks {
            match t.status() {
                TaskStatus::Pending => c.pending += 1,
                TaskStatus::Downloading => c.downloading += 1,
                TaskStatus::Downloaded => c.downloaded += 1,
                TaskStatus::Verifying => c.verifying += 1,
                TaskStatus::Verified => c.verified += 1,
                TaskStatus::Failed => c.failed += 1,
            }
        }
        c
    }

    /// Bytes received so far by tasks currently downloading.
    pub fn bytes_in_flight(&self) -> u64 {
        self.tasks
            .iter()
            .filter(|t| t.status() == TaskStatus::Downloading)
            .filter_map(|t| t.progress())
            .map(|p| p.done)
            .sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks
            .iter()
            .filter(|t| t.status() == TaskStatus::Failed)
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }
}
