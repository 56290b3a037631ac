//! Snapshot save and load.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::Row;
use std::collections::HashMap;

use super::db::{unix_timestamp, TaskStore};
use crate::scheduler::PersistenceSink;
use crate::task::{Task, TaskStatus};

/// One stored row as last written, for status display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub filename: String,
    pub remote_url: String,
    /// As persisted; may be an in-flight status if the last run was interrupted.
    pub status: TaskStatus,
    pub attempts: u32,
    /// Unix seconds of the last change to status or attempts.
    pub updated_at: i64,
}

impl TaskStore {
    /// Replace the stored snapshot with `tasks`, in one transaction.
    /// Rows whose status and attempts are unchanged keep their `updated_at`.
    pub async fn save_snapshot(&self, tasks: &[Task]) -> Result<()> {
        let now = unix_timestamp();
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query("SELECT filename, status, attempts, updated_at FROM tasks")
            .fetch_all(&mut *tx)
            .await?;
        let mut previous: HashMap<String, (String, i64, i64)> = HashMap::with_capacity(rows.len());
        for row in rows {
            previous.insert(
                row.try_get("filename")?,
                (
                    row.try_get("status")?,
                    row.try_get("attempts")?,
                    row.try_get("updated_at")?,
                ),
            );
        }

        sqlx::query("DELETE FROM tasks").execute(&mut *tx).await?;
        for (position, task) in tasks.iter().enumerate() {
            let status = task.status().as_str();
            let attempts = i64::from(task.attempts());
            let updated_at = match previous.get(task.filename()) {
                Some((s, a, at)) if s == status && *a == attempts => *at,
                _ => now,
            };
            sqlx::query(
                r#"
                INSERT INTO tasks (position, filename, remote_url, status, attempts, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(position as i64)
            .bind(task.filename())
            .bind(task.remote_url())
            .bind(status)
            .bind(attempts)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Stored rows in position order, statuses as persisted.
    pub async fn records(&self) -> Result<Vec<TaskRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT filename, remote_url, status, attempts, updated_at
            FROM tasks
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let filename: String = row.try_get("filename")?;
            let status_str: String = row.try_get("status")?;
            let status = TaskStatus::parse(&status_str)
                .with_context(|| format!("unknown status {:?} for {}", status_str, filename))?;
            let attempts: i64 = row.try_get("attempts")?;
            out.push(TaskRecord {
                remote_url: row.try_get("remote_url")?,
                status,
                attempts: u32::try_from(attempts).unwrap_or(0),
                updated_at: row.try_get("updated_at")?,
                filename,
            });
        }
        Ok(out)
    }

    /// Last snapshot as tasks; interrupted downloads and verifications are
    /// settled back to `Pending` and `Downloaded`.
    pub async fn load_snapshot(&self) -> Result<Vec<Task>> {
        let tasks = self
            .records()
            .await?
            .into_iter()
            .map(|r| Task::restore(r.filename, r.remote_url, r.status, r.attempts))
            .collect();
        Ok(tasks)
    }
}

impl PersistenceSink for TaskStore {
    async fn save(&self, tasks: &[Task]) -> Result<()> {
        self.save_snapshot(tasks).await
    }

    async fn load(&self) -> Result<Vec<Task>> {
        self.load_snapshot().await
    }
}
