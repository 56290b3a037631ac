//! Persistent task snapshots (SQLite via sqlx).
//!
//! Every save replaces the whole `tasks` table with the current task list, so
//! the database always holds one complete, self-consistent snapshot.

mod db;
mod tasks;

#[cfg(test)]
mod tests;

pub use db::TaskStore;
pub use tasks::TaskRecord;
