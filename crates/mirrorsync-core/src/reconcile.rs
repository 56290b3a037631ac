//! Build the initial task list from the remote listing and local files.
//!
//! Present remotely and absent locally => `Pending`. Present both places =>
//! `Downloaded`, so the local copy is verified before anything is fetched.
//! Local files the remote no longer lists are left alone.

use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};
use url::Url;

use crate::listing::is_safe_filename;
use crate::task::{Task, TaskStatus};

/// Remote location of `filename` under a directory URL (which must end in `/`).
pub fn remote_location(base: &Url, filename: &str) -> Result<String> {
    let url = base
        .join(filename)
        .with_context(|| format!("join {} onto {}", filename, base))?;
    Ok(url.to_string())
}

/// Tasks in filename order. Pure: the same inputs always give the same list.
pub fn reconcile(
    remote: &BTreeSet<String>,
    local: &BTreeSet<String>,
    base: &Url,
) -> Result<Vec<Task>> {
    let mut tasks = Vec::with_capacity(remote.len());
    for filename in remote {
        if !is_safe_filename(filename) {
            tracing::warn!(filename = %filename, "skipping unsafe remote filename");
            continue;
        }
        let url = remote_location(base, filename)?;
        let task = if local.contains(filename) {
            Task::downloaded(filename.as_str(), url)
        } else {
            Task::pending(filename.as_str(), url)
        };
        tasks.push(task);
    }
    let orphans = local.difference(remote).count();
    if orphans > 0 {
        tracing::info!(count = orphans, "local files not in remote listing ignored");
    }
    Ok(tasks)
}

/// Like [`reconcile`], but a file the previous run verified and that is still
/// on disk stays `Verified` when `trust_verified` is set.
pub fn reconcile_with_snapshot(
    remote: &BTreeSet<String>,
    local: &BTreeSet<String>,
    base: &Url,
    snapshot: &[Task],
    trust_verified: bool,
) -> Result<Vec<Task>> {
    let mut tasks = reconcile(remote, local, base)?;
    if !trust_verified || snapshot.is_empty() {
        return Ok(tasks);
    }
    let previous: HashMap<&str, &Task> = snapshot.iter().map(|t| (t.filename(), t)).collect();
    let mut trusted = 0usize;
    for task in tasks.iter_mut() {
        if task.status() != TaskStatus::Downloaded {
            continue;
        }
        let Some(prev) = previous.get(task.filename()) else {
            continue;
        };
        if prev.status() == TaskStatus::Verified && prev.remote_url() == task.remote_url() {
            *task = Task::restore(
                task.filename(),
                task.remote_url(),
                TaskStatus::Verified,
                prev.attempts(),
            );
            trusted += 1;
        }
    }
    tracing::debug!(trusted, "verified files carried over from last run");
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn base() -> Url {
        Url::parse("https://mirror.test/pubmed/baseline/").unwrap()
    }

    #[test]
    fn remote_only_is_pending_and_shared_is_downloaded() {
        let tasks = reconcile(&set(&["b.gz", "a.gz"]), &set(&["b.gz", "z.gz"]), &base()).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].filename(), "a.gz");
        assert_eq!(tasks[0].status(), TaskStatus::Pending);
        assert_eq!(
            tasks[0].remote_url(),
            "https://mirror.test/pubmed/baseline/a.gz"
        );
        assert_eq!(tasks[1].filename(), "b.gz");
        assert_eq!(tasks[1].status(), TaskStatus::Downloaded);
        assert!(tasks.iter().all(|t| t.attempts() == 0));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let remote = set(&["a.gz", "b.gz", "c.gz"]);
        let local = set(&["c.gz"]);
        let first = reconcile(&remote, &local, &base()).unwrap();
        let second = reconcile(&remote, &local, &base()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unsafe_names_skipped() {
        let tasks = reconcile(&set(&["..", "ok.gz"]), &BTreeSet::new(), &base()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].filename(), "ok.gz");
    }

    #[test]
    fn snapshot_keeps_verified_files_still_on_disk() {
        let snapshot = vec![
            Task::restore(
                "a.gz",
                "https://mirror.test/pubmed/baseline/a.gz",
                TaskStatus::Verified,
                1,
            ),
            Task::restore(
                "b.gz",
                "https://mirror.test/pubmed/baseline/b.gz",
                TaskStatus::Verified,
                0,
            ),
            Task::restore(
                "c.gz",
                "https://mirror.test/pubmed/baseline/c.gz",
                TaskStatus::Failed,
                3,
            ),
        ];
        let remote = set(&["a.gz", "b.gz", "c.gz"]);
        let local = set(&["a.gz", "c.gz"]);

        let tasks = reconcile_with_snapshot(&remote, &local, &base(), &snapshot, true).unwrap();
        assert_eq!(tasks[0].status(), TaskStatus::Verified);
        assert_eq!(tasks[0].attempts(), 1);
        // deleted since the last run
        assert_eq!(tasks[1].status(), TaskStatus::Pending);
        // failed files get a fresh budget
        assert_eq!(tasks[2].status(), TaskStatus::Downloaded);
        assert_eq!(tasks[2].attempts(), 0);

        let reverify = reconcile_with_snapshot(&remote, &local, &base(), &snapshot, false).unwrap();
        assert_eq!(reverify[0].status(), TaskStatus::Downloaded);
    }

    #[test]
    fn snapshot_from_other_mirror_is_not_trusted() {
        let snapshot = vec![Task::restore(
            "a.gz",
            "https://elsewhere.test/a.gz",
            TaskStatus::Verified,
            0,
        )];
        let tasks =
            reconcile_with_snapshot(&set(&["a.gz"]), &set(&["a.gz"]), &base(), &snapshot, true)
                .unwrap();
        assert_eq!(tasks[0].status(), TaskStatus::Downloaded);
    }
}
