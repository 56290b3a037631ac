//! `mirrorsync plan`: dry-run reconciliation.

use anyhow::Result;
use mirrorsync_core::config::MirrorConfig;
use mirrorsync_core::task::TaskStatus;
use std::path::Path;

use super::build_tasks;

pub async fn run_plan(cfg: &MirrorConfig, dir: &Path) -> Result<()> {
    let tasks = build_tasks(cfg, dir, &[], false).await?;
    if tasks.is_empty() {
        println!("Nothing matches {} at {}.", cfg.file_pattern, cfg.base_url);
        return Ok(());
    }
    let mut download = 0usize;
    let mut verify = 0usize;
    for t in &tasks {
        let action = match t.status() {
            TaskStatus::Pending => {
                download += 1;
                "download"
            }
            _ => {
                verify += 1;
                "verify"
            }
        };
        println!("{:<10} {}", action, t.filename());
    }
    println!("{} to download, {} to verify", download, verify);
    Ok(())
}
