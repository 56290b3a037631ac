//! Checksum command: hash a local file with the engine sync uses.

use anyhow::Result;
use mirrorsync_core::checksum::{FileHasher, HashAlgorithm};
use mirrorsync_core::scheduler::HashEngine;
use std::path::Path;

/// Compute and print the digest of the given file, coreutils style.
pub async fn run_checksum(path: &Path, algorithm: HashAlgorithm) -> Result<()> {
    let digest = FileHasher::new(algorithm).hash(path).await?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
