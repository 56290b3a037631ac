//! On-disk file lifecycle for transfers.
//!
//! A download streams into `<name>.part` and is atomically renamed into place
//! once complete, so a mirrored filename only ever refers to a whole file.
//! Failed transfers delete their temp file; nothing partial is kept.

use std::io;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `file.gz` → `file.gz.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Atomically rename the temp file to the final path, replacing any stale copy.
/// Fails if `final_path` is on a different filesystem.
pub fn finalize(temp_path: &Path, final_path: &Path) -> io::Result<()> {
    std::fs::rename(temp_path, final_path)
}

/// Remove a temp file left by a failed transfer. Missing files are fine.
pub fn discard(temp_path: &Path) {
    match std::fs::remove_file(temp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %temp_path.display(), "could not remove temp file: {}", e),
    }
}
