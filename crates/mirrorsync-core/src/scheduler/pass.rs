//! One joint pass of the download and verify pools.
//!
//! Workers are boxed local futures in two `FuturesUnordered` sets; the loop
//! refills both pools, waits for the next completion or progress event, and
//! applies the resulting transition before persisting the snapshot.

use anyhow::Result;
use futures_util::future::{FutureExt, LocalBoxFuture};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::path::PathBuf;
use tokio::sync::mpsc::unbounded_channel;

use crate::retry::{classify, RetryDecision, TransferError};
use crate::task::{TaskId, TaskRegistry, TaskStatus, VERIFY_SCALE};

use super::engines::{ChecksumOracle, HashEngine, PersistenceSink, TransferEngine};
use super::notice::{Notice, PipelineObserver};
use super::pipeline::{task_mut, Pipeline};
use super::progress::{ProgressEvent, ProgressReporter, Throttle};
use super::queues::WorkQueues;

type DownloadResult = (TaskId, Result<u64, TransferError>);
type VerifyResult = (TaskId, VerifyOutcome);

enum VerifyOutcome {
    Match,
    Mismatch { expected: String, actual: String },
    /// Hashing the local file or fetching the expected hash failed.
    Unavailable(String),
}

enum Event {
    Downloaded(DownloadResult),
    Verified(VerifyResult),
    Progress(ProgressEvent),
}

impl<T, H, O, P> Pipeline<T, H, O, P>
where
    T: TransferEngine,
    H: HashEngine,
    O: ChecksumOracle,
    P: PersistenceSink,
{
    /// Runs until the verify side is drained and the download pool has closed.
    /// The download pool closes once its queue is empty with nothing in flight;
    /// tasks bounced back by verification after that stay queued for the next pass.
    pub(super) async fn run_pass(
        &self,
        registry: &mut TaskRegistry,
        queues: &mut WorkQueues,
        observer: &mut dyn PipelineObserver,
    ) -> Result<()> {
        let (progress_tx, mut progress_rx) = unbounded_channel::<ProgressEvent>();
        let mut downloads: FuturesUnordered<LocalBoxFuture<'_, DownloadResult>> =
            FuturesUnordered::new();
        let mut verifications: FuturesUnordered<LocalBoxFuture<'_, VerifyResult>> =
            FuturesUnordered::new();
        let mut downloads_open = true;
        let mut throttle = Throttle::new(self.options.progress_interval);

        loop {
            if downloads_open {
                while downloads.len() < self.options.download_concurrency {
                    let Some(id) = queues.pop_download() else {
                        break;
                    };
                    let task = task_mut(registry, id)?;
                    task.begin_download()?;
                    tracing::debug!(
                        filename = %task.filename(),
                        attempt = task.attempts() + 1,
                        "download started"
                    );
                    let url = task.remote_url().to_string();
                    let dest = self.mirror_dir.join(task.filename());
                    let reporter =
                        ProgressReporter::new(id, TaskStatus::Downloading, progress_tx.clone());
                    downloads.push(self.download_worker(id, url, dest, reporter));
                    self.persist(registry).await?;
                }
                if downloads.is_empty() && queues.download_len() == 0 {
                    downloads_open = false;
                }
            }

            while verifications.len() < self.options.verify_concurrency {
                let Some(id) = queues.pop_verify() else {
                    break;
                };
                let task = task_mut(registry, id)?;
                task.begin_verify()?;
                tracing::debug!(filename = %task.filename(), "verification started");
                let filename = task.filename().to_string();
                let url = task.remote_url().to_string();
                let path = self.mirror_dir.join(&filename);
                let reporter =
                    ProgressReporter::new(id, TaskStatus::Verifying, progress_tx.clone());
                verifications.push(self.verify_worker(id, filename, url, path, reporter));
                self.persist(registry).await?;
            }

            if !downloads_open && verifications.is_empty() && queues.verify_len() == 0 {
                break;
            }

            let event = tokio::select! {
                Some(done) = downloads.next(), if !downloads.is_empty() => Event::Downloaded(done),
                Some(done) = verifications.next(), if !verifications.is_empty() => Event::Verified(done),
                Some(ev) = progress_rx.recv() => Event::Progress(ev),
            };

            match event {
                Event::Progress(ev) => {
                    if let Some(task) = registry.get_mut(ev.task) {
                        task.set_progress(ev.stage, ev.progress);
                    }
                    if throttle.ready() {
                        observer.tick(registry);
                    }
                }
                Event::Downloaded((id, Ok(bytes))) => {
                    let task = task_mut(registry, id)?;
                    task.complete_download()?;
                    tracing::info!(filename = %task.filename(), bytes, "downloaded");
                    queues.push_verify(id);
                    self.persist(registry).await?;
                }
                Event::Downloaded((id, Err(err))) => {
                    self.download_failed(registry, queues, observer, id, err)
                        .await?;
                }
                Event::Verified((id, outcome)) => {
                    self.verification_done(registry, queues, observer, id, outcome)
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn download_failed(
        &self,
        registry: &mut TaskRegistry,
        queues: &mut WorkQueues,
        observer: &mut dyn PipelineObserver,
        id: TaskId,
        err: TransferError,
    ) -> Result<()> {
        let policy = self.options.retry;
        let kind = classify(&err);
        let task = task_mut(registry, id)?;
        let decision = task.fail_download(&policy)?;
        let filename = task.filename().to_string();
        let attempts = task.attempts();
        match decision {
            RetryDecision::Requeue => {
                tracing::warn!(
                    filename = %filename,
                    attempt = attempts,
                    kind = %kind,
                    "download failed, requeued: {}",
                    err
                );
                queues.push_download_back(id);
                observer.notice(&Notice::RetryScheduled {
                    filename,
                    attempt: attempts,
                    max_attempts: policy.max_attempts,
                    kind,
                    error: err.to_string(),
                });
            }
            RetryDecision::NoRetry => {
                tracing::error!(
                    filename = %filename,
                    attempts,
                    kind = %kind,
                    "download failed permanently: {}",
                    err
                );
                observer.notice(&Notice::DownloadFailed {
                    filename,
                    attempts,
                    error: err.to_string(),
                });
            }
        }
        self.persist(registry).await
    }

    async fn verification_done(
        &self,
        registry: &mut TaskRegistry,
        queues: &mut WorkQueues,
        observer: &mut dyn PipelineObserver,
        id: TaskId,
        outcome: VerifyOutcome,
    ) -> Result<()> {
        let task = task_mut(registry, id)?;
        let filename = task.filename().to_string();
        match outcome {
            VerifyOutcome::Match => {
                task.complete_verify()?;
                tracing::info!(filename = %filename, "verified");
                observer.notice(&Notice::Verified { filename });
            }
            VerifyOutcome::Mismatch { expected, actual } => {
                task.reject_verify()?;
                queues.push_download_front(id);
                tracing::warn!(filename = %filename, %expected, %actual, "hash mismatch");
                observer.notice(&Notice::HashMismatch {
                    filename,
                    expected,
                    actual,
                });
            }
            VerifyOutcome::Unavailable(error) => {
                task.reject_verify()?;
                queues.push_download_front(id);
                tracing::warn!(filename = %filename, "could not verify: {}", error);
                observer.notice(&Notice::VerifyUnavailable { filename, error });
            }
        }
        self.persist(registry).await
    }

    fn download_worker(
        &self,
        id: TaskId,
        url: String,
        dest: PathBuf,
        reporter: ProgressReporter,
    ) -> LocalBoxFuture<'_, DownloadResult> {
        async move {
            let result = self.transfer.download(&url, &dest, reporter).await;
            (id, result)
        }
        .boxed_local()
    }

    /// Hash (to 50), expected hash (to 75), compare (to 100).
    fn verify_worker(
        &self,
        id: TaskId,
        filename: String,
        url: String,
        path: PathBuf,
        reporter: ProgressReporter,
    ) -> LocalBoxFuture<'_, VerifyResult> {
        async move {
            let actual = match self.hasher.hash(&path).await {
                Ok(h) => h,
                Err(e) => return (id, VerifyOutcome::Unavailable(format!("{:#}", e))),
            };
            reporter.report(VERIFY_SCALE / 2, Some(VERIFY_SCALE));

            let expected = match self.oracle.expected_hash(&filename, &url).await {
                Ok(h) => h,
                Err(e) => return (id, VerifyOutcome::Unavailable(e.to_string())),
            };
            reporter.report(VERIFY_SCALE * 3 / 4, Some(VERIFY_SCALE));

            let outcome = if actual.trim().eq_ignore_ascii_case(expected.trim()) {
                VerifyOutcome::Match
            } else {
                VerifyOutcome::Mismatch { expected, actual }
            };
            reporter.report(VERIFY_SCALE, Some(VERIFY_SCALE));
            (id, outcome)
        }
        .boxed_local()
    }
}
