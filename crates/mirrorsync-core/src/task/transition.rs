//! Legal status transitions.
//!
//! ```text
//! Pending --begin_download--> Downloading --complete_download--> Downloaded
//! Downloading --fail_download--> Pending (requeue) | Failed (exhausted)
//! Downloaded --begin_verify--> Verifying --complete_verify--> Verified
//! Verifying --reject_verify--> Pending
//! Pending --abandon--> Failed
//! ```

use thiserror::Error;

use super::{Progress, Task, TaskStatus};
use crate::retry::{RetryDecision, RetryPolicy};

/// A transition the state machine does not allow. Seeing one means the scheduler's
/// queue bookkeeping is wrong, so callers abort the run.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal transition for {filename}: {from} -> {to}")]
pub struct TransitionError {
    pub filename: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Synthetic scale used for verification progress.
pub(crate) const VERIFY_SCALE: u64 = 100;

impl Task {
    fn transition(&mut self, from: TaskStatus, to: TaskStatus) -> Result<(), TransitionError> {
        if self.status != from {
            return Err(TransitionError {
                filename: self.filename.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.progress = None;
        Ok(())
    }

    pub(crate) fn begin_download(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Pending, TaskStatus::Downloading)?;
        self.progress = Some(Progress::new(0, None));
        Ok(())
    }

    pub(crate) fn complete_download(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Downloading, TaskStatus::Downloaded)
    }

    /// Counts the failed attempt and moves to `Pending` or `Failed` per the policy.
    pub(crate) fn fail_download(
        &mut self,
        policy: &RetryPolicy,
    ) -> Result<RetryDecision, TransitionError> {
        let decision = policy.decide(self.attempts + 1);
        let to = match decision {
            RetryDecision::Requeue => TaskStatus::Pending,
            RetryDecision::NoRetry => TaskStatus::Failed,
        };
        self.transition(TaskStatus::Downloading, to)?;
        self.attempts += 1;
        Ok(decision)
    }

    pub(crate) fn begin_verify(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Downloaded, TaskStatus::Verifying)?;
        self.progress = Some(Progress::new(0, Some(VERIFY_SCALE)));
        Ok(())
    }

    pub(crate) fn complete_verify(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Verifying, TaskStatus::Verified)
    }

    /// Verification failed; the attempt counter is left alone.
    pub(crate) fn reject_verify(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Verifying, TaskStatus::Pending)
    }

    /// Give up on a task still waiting for download when the pass limit is reached.
    pub(crate) fn abandon(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Pending, TaskStatus::Failed)
    }

    /// Ignored unless the task is in `expected` (late events from a finished worker).
    pub(crate) fn set_progress(&mut self, expected: TaskStatus, progress: Progress) -> bool {
        if self.status != expected || !expected.is_in_flight() {
            return false;
        }
        self.progress = Some(progress);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task::pending("a.gz", "http://mirror.test/a.gz")
    }

    #[test]
    fn happy_path() {
        let mut t = task();
        t.begin_download().unwrap();
        assert_eq!(t.status(), TaskStatus::Downloading);
        assert_eq!(t.progress(), Some(Progress::new(0, None)));
        t.complete_download().unwrap();
        assert_eq!(t.status(), TaskStatus::Downloaded);
        assert!(t.progress().is_none());
        t.begin_verify().unwrap();
        assert_eq!(t.progress(), Some(Progress::new(0, Some(100))));
        t.complete_verify().unwrap();
        assert_eq!(t.status(), TaskStatus::Verified);
        assert!(t.progress().is_none());
        assert_eq!(t.attempts(), 0);
    }

    #[test]
    fn download_failures_exhaust_into_failed() {
        let policy = RetryPolicy::default();
        let mut t = task();
        for expected_attempts in 1..=2 {
            t.begin_download().unwrap();
            assert_eq!(t.fail_download(&policy).unwrap(), RetryDecision::Requeue);
            assert_eq!(t.status(), TaskStatus::Pending);
            assert_eq!(t.attempts(), expected_attempts);
        }
        t.begin_download().unwrap();
        assert_eq!(t.fail_download(&policy).unwrap(), RetryDecision::NoRetry);
        assert_eq!(t.status(), TaskStatus::Failed);
        assert_eq!(t.attempts(), policy.max_attempts);
        assert!(t.begin_download().is_err());
    }

    #[test]
    fn verify_rejection_keeps_attempts() {
        let policy = RetryPolicy::default();
        let mut t = task();
        t.begin_download().unwrap();
        t.fail_download(&policy).unwrap();
        t.begin_download().unwrap();
        t.complete_download().unwrap();
        t.begin_verify().unwrap();
        t.reject_verify().unwrap();
        assert_eq!(t.status(), TaskStatus::Pending);
        assert_eq!(t.attempts(), 1);
        assert!(t.progress().is_none());
    }

    #[test]
    fn illegal_transition_reports_states() {
        let mut t = task();
        let err = t.begin_verify().unwrap_err();
        assert_eq!(err.from, TaskStatus::Pending);
        assert_eq!(err.to, TaskStatus::Verifying);
        assert_eq!(t.status(), TaskStatus::Pending);
    }

    #[test]
    fn progress_only_applies_to_matching_stage() {
        let mut t = task();
        assert!(!t.set_progress(TaskStatus::Downloading, Progress::new(1, None)));
        t.begin_download().unwrap();
        assert!(t.set_progress(TaskStatus::Downloading, Progress::new(10, Some(20))));
        assert_eq!(t.progress(), Some(Progress::new(10, Some(20))));
        assert!(!t.set_progress(TaskStatus::Verifying, Progress::new(50, Some(100))));
        t.complete_download().unwrap();
        assert!(!t.set_progress(TaskStatus::Downloaded, Progress::new(1, None)));
        assert!(t.progress().is_none());
    }

    #[test]
    fn abandon_only_from_pending() {
        let mut t = task();
        t.abandon().unwrap();
        assert_eq!(t.status(), TaskStatus::Failed);
        let mut v = Task::downloaded("b.gz", "http://mirror.test/b.gz");
        assert!(v.abandon().is_err());
    }
}
