//! Checksum oracle backed by per-file checksum resources on the mirror.
//!
//! The expected hash of `<remote location>` is read from
//! `<remote location><suffix>` (e.g. `pubmed24n0001.xml.gz.md5`) and pulled out
//! of the body with a regex that has a named `hash` group.

mod parse;

use anyhow::{bail, Context, Result};
use regex::Regex;
use thiserror::Error;

use crate::config::{MirrorConfig, TransferConfig};
use crate::retry::TransferError;
use crate::scheduler::ChecksumOracle;
use crate::transfer::fetch_text;

pub use parse::extract_hash;

/// Why the expected hash of a file could not be obtained.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The checksum resource could not be fetched (network error or HTTP status).
    #[error("fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: TransferError,
    },
    /// The resource was fetched but contains no hash matching the pattern.
    #[error("no checksum found in {url}")]
    Malformed { url: String },
    #[error("checksum worker: {0}")]
    Worker(String),
}

/// Fetches `<remote_url><suffix>` with libcurl and parses the hash out of it.
#[derive(Debug, Clone)]
pub struct HttpChecksumOracle {
    suffix: String,
    pattern: Regex,
    transfer: TransferConfig,
}

impl HttpChecksumOracle {
    /// `pattern` must contain a named group `hash`.
    pub fn new(suffix: impl Into<String>, pattern: &str, transfer: TransferConfig) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("invalid checksum_pattern: {}", pattern))?;
        if !pattern.capture_names().any(|name| name == Some("hash")) {
            bail!("checksum_pattern has no named group `hash`: {}", pattern);
        }
        Ok(Self {
            suffix: suffix.into(),
            pattern,
            transfer,
        })
    }

    pub fn from_config(cfg: &MirrorConfig) -> Result<Self> {
        Self::new(
            cfg.checksum_suffix.clone(),
            &cfg.checksum_pattern,
            cfg.transfer_config(),
        )
    }

    /// Location of the checksum resource for a file.
    pub fn checksum_url(&self, remote_url: &str) -> String {
        format!("{}{}", remote_url, self.suffix)
    }
}

impl ChecksumOracle for HttpChecksumOracle {
    async fn expected_hash(&self, filename: &str, remote_url: &str) -> Result<String, OracleError> {
        let url = self.checksum_url(remote_url);
        let body = {
            let url = url.clone();
            let config = self.transfer.clone();
            tokio::task::spawn_blocking(move || fetch_text(&url, &config))
                .await
                .map_err(|e| OracleError::Worker(e.to_string()))?
        }
        .map_err(|source| OracleError::Fetch {
            url: url.clone(),
            source,
        })?;
        let hash = extract_hash(&body, &self.pattern, filename)
            .ok_or_else(|| OracleError::Malformed { url: url.clone() })?;
        tracing::debug!(filename, %url, %hash, "expected hash fetched");
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CHECKSUM_PATTERN;

    #[test]
    fn checksum_url_appends_suffix() {
        let o = HttpChecksumOracle::new(".md5", DEFAULT_CHECKSUM_PATTERN, TransferConfig::default())
            .unwrap();
        assert_eq!(
            o.checksum_url("https://mirror.test/data/a.xml.gz"),
            "https://mirror.test/data/a.xml.gz.md5"
        );
    }

    #[test]
    fn pattern_without_hash_group_rejected() {
        let err = HttpChecksumOracle::new(".md5", r"[0-9a-f]{32}", TransferConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("hash"));
        assert!(HttpChecksumOracle::new(".md5", "(", TransferConfig::default()).is_err());
    }

    #[test]
    fn oracle_error_messages() {
        let e = OracleError::Fetch {
            url: "http://m/a.gz.md5".into(),
            source: TransferError::Http(404),
        };
        assert_eq!(e.to_string(), "fetch http://m/a.gz.md5: HTTP 404");
        let e = OracleError::Malformed {
            url: "http://m/a.gz.md5".into(),
        };
        assert_eq!(e.to_string(), "no checksum found in http://m/a.gz.md5");
    }
}
