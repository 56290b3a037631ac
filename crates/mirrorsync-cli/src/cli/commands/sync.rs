//! `mirrorsync sync`: reconcile, then run the download/verify pipeline.

use anyhow::{Context, Result};
use mirrorsync_core::checksum::FileHasher;
use mirrorsync_core::config::MirrorConfig;
use mirrorsync_core::oracle::HttpChecksumOracle;
use mirrorsync_core::scheduler::{Pipeline, PipelineOptions};
use mirrorsync_core::task::TaskRegistry;
use mirrorsync_core::transfer::CurlTransfer;
use std::path::Path;
use std::process::ExitCode;

use super::build_tasks;
use crate::cli::observer::TerminalObserver;
use crate::cli::open_store;

pub async fn run_sync(
    cfg: &MirrorConfig,
    dir: &Path,
    db: Option<&Path>,
    trust_verified: bool,
) -> Result<ExitCode> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create mirror dir: {}", dir.display()))?;
    let store = open_store(db).await?;
    let snapshot = store
        .load_snapshot()
        .await
        .context("load previous task snapshot")?;
    let tasks = build_tasks(cfg, dir, &snapshot, trust_verified).await?;
    let mut registry = TaskRegistry::new(tasks);

    let pipeline = Pipeline::new(
        PipelineOptions::from_config(cfg),
        dir,
        CurlTransfer::new(cfg.transfer_config()),
        FileHasher::new(cfg.hash_algorithm),
        HttpChecksumOracle::from_config(cfg)?,
        store,
    );
    let mut observer = TerminalObserver::new();
    let summary = pipeline.run(&mut registry, &mut observer).await?;
    observer.finish();

    println!(
        "{} verified, {} failed ({} pass{})",
        summary.verified,
        summary.failed_count(),
        summary.passes,
        if summary.passes == 1 { "" } else { "es" }
    );
    for name in &summary.failed {
        println!("  failed: {}", name);
    }

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(summary.exit_code() as u8))
    }
}
