//! Pipeline driver: runs joint download/verify passes to a fixpoint.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::MirrorConfig;
use crate::retry::RetryPolicy;
use crate::task::{Task, TaskId, TaskRegistry};

use super::engines::{ChecksumOracle, HashEngine, PersistenceSink, TransferEngine};
use super::notice::{Notice, PipelineObserver};
use super::queues::WorkQueues;
use super::summary::RunSummary;
use super::{DOWNLOAD_CONCURRENCY, VERIFY_CONCURRENCY};

/// Passes before files that keep failing verification are given up on.
pub const DEFAULT_MAX_PASSES: u32 = 4;

/// Pool sizes and limits for one run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub download_concurrency: usize,
    pub verify_concurrency: usize,
    pub retry: RetryPolicy,
    /// Minimum time between observer ticks.
    pub progress_interval: Duration,
    pub max_passes: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            download_concurrency: DOWNLOAD_CONCURRENCY,
            verify_concurrency: VERIFY_CONCURRENCY,
            retry: RetryPolicy::default(),
            progress_interval: Duration::from_millis(500),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(cfg: &MirrorConfig) -> Self {
        Self {
            download_concurrency: cfg.download_concurrency.max(1),
            verify_concurrency: cfg.verify_concurrency.max(1),
            retry: RetryPolicy::new(cfg.max_retries),
            progress_interval: cfg.progress_interval(),
            max_passes: cfg.max_passes.max(1),
        }
    }
}

/// Mirrors the tasks of a registry into `mirror_dir` using the given engines.
pub struct Pipeline<T, H, O, P> {
    pub(super) options: PipelineOptions,
    pub(super) mirror_dir: PathBuf,
    pub(super) transfer: T,
    pub(super) hasher: H,
    pub(super) oracle: O,
    pub(super) sink: P,
}

impl<T, H, O, P> Pipeline<T, H, O, P>
where
    T: TransferEngine,
    H: HashEngine,
    O: ChecksumOracle,
    P: PersistenceSink,
{
    pub fn new(
        options: PipelineOptions,
        mirror_dir: impl Into<PathBuf>,
        transfer: T,
        hasher: H,
        oracle: O,
        sink: P,
    ) -> Self {
        let mut options = options;
        options.download_concurrency = options.download_concurrency.max(1);
        options.verify_concurrency = options.verify_concurrency.max(1);
        options.max_passes = options.max_passes.max(1);
        Self {
            options,
            mirror_dir: mirror_dir.into(),
            transfer,
            hasher,
            oracle,
            sink,
        }
    }

    #[cfg(test)]
    pub(super) fn sink(&self) -> &P {
        &self.sink
    }

    /// Run passes until the download queue stays empty or `max_passes` is reached.
    ///
    /// Returns an error only for persistence failures and illegal transitions;
    /// per-file failures end up in the summary.
    pub async fn run(
        &self,
        registry: &mut TaskRegistry,
        observer: &mut dyn PipelineObserver,
    ) -> Result<RunSummary> {
        let mut queues = WorkQueues::seed(registry);
        tracing::info!(
            tasks = registry.len(),
            to_download = queues.download_len(),
            to_verify = queues.verify_len(),
            "pipeline starting"
        );
        self.persist(registry).await?;

        let mut passes = 0u32;
        loop {
            passes += 1;
            if passes > 1 {
                let count = queues.download_len();
                tracing::info!(pass = passes, count, "starting re-download pass");
                observer.notice(&Notice::RedownloadPass {
                    pass: passes,
                    count,
                });
            }
            self.run_pass(registry, &mut queues, observer).await?;

            if queues.download_len() == 0 {
                break;
            }
            if passes >= self.options.max_passes {
                for id in queues.drain_download() {
                    let task = task_mut(registry, id)?;
                    task.abandon()?;
                    let filename = task.filename().to_string();
                    tracing::warn!(filename = %filename, passes, "did not converge, giving up");
                    observer.notice(&Notice::NotConverged { filename });
                    self.persist(registry).await?;
                }
                break;
            }
        }

        observer.tick(registry);
        let summary = summarize(registry, passes);
        tracing::info!(
            passes = summary.passes,
            verified = summary.verified,
            failed = summary.failed_count(),
            "pipeline finished"
        );
        Ok(summary)
    }

    pub(super) async fn persist(&self, registry: &TaskRegistry) -> Result<()> {
        self.sink
            .save(registry.tasks())
            .await
            .context("persist task snapshot")
    }
}

pub(super) fn task_mut(registry: &mut TaskRegistry, id: TaskId) -> Result<&mut Task> {
    registry
        .get_mut(id)
        .ok_or_else(|| anyhow::anyhow!("task {} not in registry", id))
}

fn summarize(registry: &TaskRegistry, passes: u32) -> RunSummary {
    RunSummary {
        passes,
        verified: registry.counts().verified,
        failed: registry
            .failed()
            .map(|t| t.filename().to_string())
            .collect(),
    }
}
