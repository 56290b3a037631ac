//! `mirrorsync status`: show the last persisted snapshot.

use anyhow::Result;
use std::path::Path;

use crate::cli::open_store;

pub async fn run_status(db: Option<&Path>, json: bool) -> Result<()> {
    let store = open_store(db).await?;
    let records = store.records().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No tasks in database.");
        return Ok(());
    }
    println!(
        "{:<12} {:<8} {:<12} {}",
        "STATUS", "ATTEMPTS", "UPDATED", "FILENAME"
    );
    for r in &records {
        println!(
            "{:<12} {:<8} {:<12} {}",
            r.status.as_str(),
            r.attempts,
            r.updated_at,
            r.filename
        );
    }
    let failed = records
        .iter()
        .filter(|r| r.status == mirrorsync_core::task::TaskStatus::Failed)
        .count();
    println!("{} task(s), {} failed", records.len(), failed);
    Ok(())
}
