//! Progress messages from workers to the driver loop.
//!
//! Workers never touch the registry; they send cumulative progress for their
//! task over an unbounded channel and the driver applies it.

use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

use crate::task::{Progress, TaskId, TaskStatus};

/// Cumulative progress of one in-flight task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub task: TaskId,
    /// `Downloading` or `Verifying`; stale events for a finished stage are dropped.
    pub stage: TaskStatus,
    pub progress: Progress,
}

/// Handle a worker uses to report progress for its task.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    task: TaskId,
    stage: TaskStatus,
    tx: UnboundedSender<ProgressEvent>,
}

impl ProgressReporter {
    pub fn new(task: TaskId, stage: TaskStatus, tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { task, stage, tx }
    }

    /// Send cumulative `done` out of `total`. A closed channel is ignored.
    pub fn report(&self, done: u64, total: Option<u64>) {
        let _ = self.tx.send(ProgressEvent {
            task: self.task,
            stage: self.stage,
            progress: Progress::new(done, total),
        });
    }
}

/// Rate limiter for observer ticks.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True at most once per interval; the first call is always ready.
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
