//! CLI command handlers. Each command is in its own file.

mod checksum;
mod completions;
mod plan;
mod status;
mod sync;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use plan::run_plan;
pub use status::run_status;
pub use sync::run_sync;

use anyhow::Result;
use mirrorsync_core::config::MirrorConfig;
use mirrorsync_core::listing;
use mirrorsync_core::reconcile;
use mirrorsync_core::task::Task;
use std::path::Path;

/// List remote and local files and reconcile them against the last snapshot.
async fn build_tasks(
    cfg: &MirrorConfig,
    dir: &Path,
    snapshot: &[Task],
    trust_verified: bool,
) -> Result<Vec<Task>> {
    let base = cfg.base_url()?;
    let pattern = cfg.file_regex()?;
    let remote =
        listing::fetch_remote_listing_async(base.as_str(), &pattern, &cfg.transfer_config())
            .await?;
    let local = listing::list_local(dir, &pattern)?;
    tracing::info!(
        remote = remote.len(),
        local = local.len(),
        dir = %dir.display(),
        "reconciling"
    );
    reconcile::reconcile_with_snapshot(&remote, &local, &base, snapshot, trust_verified)
}
