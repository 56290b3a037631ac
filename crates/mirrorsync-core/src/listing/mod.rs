//! Remote and local file listings.
//!
//! The remote side is one GET of the mirrored directory with every substring
//! matching the file pattern extracted from the body (HTML index or plain
//! text). The local side is the set of regular files in the mirror directory
//! whose whole name matches the same pattern.

mod parse;

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::TransferConfig;
use crate::transfer::fetch_text;

pub use parse::{anchored, extract_filenames, is_safe_filename};

/// Fetch the remote directory listing and extract matching filenames.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn fetch_remote_listing(
    base_url: &str,
    pattern: &Regex,
    config: &TransferConfig,
) -> Result<BTreeSet<String>> {
    let body = fetch_text(base_url, config)
        .with_context(|| format!("list remote directory {}", base_url))?;
    let names = extract_filenames(&body, pattern);
    tracing::info!(base_url, files = names.len(), "remote listing fetched");
    Ok(names)
}

/// Async wrapper around [`fetch_remote_listing`] on the blocking pool.
pub async fn fetch_remote_listing_async(
    base_url: &str,
    pattern: &Regex,
    config: &TransferConfig,
) -> Result<BTreeSet<String>> {
    let base_url = base_url.to_string();
    let pattern = pattern.clone();
    let config = config.clone();
    tokio::task::spawn_blocking(move || fetch_remote_listing(&base_url, &pattern, &config))
        .await
        .context("listing task join")?
}

/// Names of regular files in `dir` whose whole name matches `pattern`.
/// A missing directory is an empty mirror.
pub fn list_local(dir: &Path, pattern: &Regex) -> Result<BTreeSet<String>> {
    let whole = anchored(pattern).context("anchor file pattern")?;
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(e).with_context(|| format!("read mirror dir: {}", dir.display())),
    };
    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read mirror dir: {}", dir.display()))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if whole.is_match(&name) {
            names.insert(name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_local_filters_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a1.gz", "b2.gz", "a1.gz.part", "notes.txt", "a1.gz.md5"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("c3.gz")).unwrap();
        let pattern = Regex::new(r"[a-z]\d\.gz").unwrap();
        let names = list_local(dir.path(), &pattern).unwrap();
        let names: Vec<_> = names.into_iter().collect();
        assert_eq!(names, vec!["a1.gz".to_string(), "b2.gz".to_string()]);
    }

    #[test]
    fn list_local_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = Regex::new(r".*").unwrap();
        let names = list_local(&dir.path().join("absent"), &pattern).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn list_local_alternation_uses_whole_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "ab", "abc"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let pattern = Regex::new("a|ab").unwrap();
        let names: Vec<_> = list_local(dir.path(), &pattern).unwrap().into_iter().collect();
        assert_eq!(names, vec!["a".to_string(), "ab".to_string()]);
    }
}
