//! Tests for the task store (use in-memory DB helper from db).

use crate::scheduler::PersistenceSink;
use crate::store::db::open_memory;
use crate::store::TaskStore;
use crate::task::{Task, TaskStatus};

fn tasks() -> Vec<Task> {
    vec![
        Task::pending("b.gz", "http://m/b.gz"),
        Task::restore("a.gz", "http://m/a.gz", TaskStatus::Verified, 1),
        Task::restore("c.gz", "http://m/c.gz", TaskStatus::Failed, 3),
    ]
}

#[tokio::test]
async fn snapshot_roundtrip_keeps_order() {
    let store = open_memory().await.unwrap();
    assert!(store.load().await.unwrap().is_empty());

    store.save(&tasks()).await.unwrap();
    let loaded = store.load().await.unwrap();
    assert_eq!(loaded, tasks());
}

#[tokio::test]
async fn save_replaces_previous_snapshot() {
    let store = open_memory().await.unwrap();
    store.save(&tasks()).await.unwrap();
    store
        .save(&[Task::pending("z.gz", "http://m/z.gz")])
        .await
        .unwrap();
    let loaded = store.load().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].filename(), "z.gz");
}

#[tokio::test]
async fn in_flight_statuses_settle_on_load() {
    let store = open_memory().await.unwrap();
    let mut downloading = Task::pending("a.gz", "http://m/a.gz");
    downloading.begin_download().unwrap();
    let mut verifying = Task::downloaded("b.gz", "http://m/b.gz");
    verifying.begin_verify().unwrap();
    store.save(&[downloading, verifying]).await.unwrap();

    let records = store.records().await.unwrap();
    assert_eq!(records[0].status, TaskStatus::Downloading);
    assert_eq!(records[1].status, TaskStatus::Verifying);

    let loaded = store.load().await.unwrap();
    assert_eq!(loaded[0].status(), TaskStatus::Pending);
    assert_eq!(loaded[1].status(), TaskStatus::Downloaded);
    assert!(loaded.iter().all(|t| t.progress().is_none()));
}

#[tokio::test]
async fn unchanged_rows_keep_updated_at() {
    let store = open_memory().await.unwrap();
    store.save(&tasks()).await.unwrap();
    sqlx::query("UPDATE tasks SET updated_at = 42")
        .execute(&store.pool)
        .await
        .unwrap();

    let mut next = tasks();
    next[0] = Task::restore("b.gz", "http://m/b.gz", TaskStatus::Downloaded, 0);
    store.save(&next).await.unwrap();

    let records = store.records().await.unwrap();
    assert_ne!(records[0].updated_at, 42);
    assert_eq!(records[1].updated_at, 42);
    assert_eq!(records[2].updated_at, 42);
}

#[tokio::test]
async fn unknown_status_is_an_error() {
    let store = open_memory().await.unwrap();
    sqlx::query(
        "INSERT INTO tasks (position, filename, remote_url, status, attempts, updated_at) \
         VALUES (0, 'a.gz', 'http://m/a.gz', 'queued', 0, 0)",
    )
    .execute(&store.pool)
    .await
    .unwrap();
    assert!(store.load().await.is_err());
}

#[tokio::test]
async fn open_at_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tasks.db");
    let store = TaskStore::open_at(&path).await.unwrap();
    store.save(&tasks()).await.unwrap();
    drop(store);

    let reopened = TaskStore::open_at(&path).await.unwrap();
    assert_eq!(reopened.load().await.unwrap().len(), 3);
}
