use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::checksum::HashAlgorithm;
use crate::retry::MAX_RETRIES;
use crate::scheduler::{DEFAULT_MAX_PASSES, DOWNLOAD_CONCURRENCY, VERIFY_CONCURRENCY};

pub const DEFAULT_BASE_URL: &str = "https://ftp.ncbi.nlm.nih.gov/pubmed/baseline/";
pub const DEFAULT_FILE_PATTERN: &str = r"pubmed\d+n\d+\.xml\.gz";
pub const DEFAULT_CHECKSUM_SUFFIX: &str = ".md5";
/// Accepts `MD5(name)= <hex>`, `SHA256(name)= <hex>` and coreutils `<hex>  name` lines.
pub const DEFAULT_CHECKSUM_PATTERN: &str =
    r"(?m)^(?:(?:MD5|SHA256)\([^)]*\)\s*=\s*)?(?P<hash>[0-9A-Fa-f]{32,64})(?:\s+\*?\S+)?\s*$";

/// Network timeouts applied by the curl-backed engines (optional section in config.toml).
///
/// The pipeline itself never times out a worker; these turn a stalled connection
/// into an ordinary transfer failure that the retry policy handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Maximum time to establish a connection, in seconds.
    pub connect_timeout_secs: u64,
    /// Abort when the rate stays below this many bytes/sec...
    pub low_speed_limit_bytes: u32,
    /// ...for this many seconds.
    pub low_speed_time_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
        }
    }
}

impl TransferConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }
}

/// Global configuration loaded from `~/.config/mirrorsync/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Remote directory that is listed and mirrored.
    pub base_url: String,
    /// Regex a filename must match to be mirrored (remote listing and local scan).
    pub file_pattern: String,
    /// Appended to a file's remote location to address its checksum resource.
    pub checksum_suffix: String,
    /// Regex with a named `hash` group, applied to the checksum resource body.
    pub checksum_pattern: String,
    /// Digest the checksum resources are expressed in.
    pub hash_algorithm: HashAlgorithm,
    /// Concurrent transfers.
    pub download_concurrency: usize,
    /// Concurrent verifications.
    pub verify_concurrency: usize,
    /// Failed download attempts before a file is given up on.
    pub max_retries: u32,
    /// Minimum interval between progress ticks sent to the terminal.
    pub progress_interval_ms: u64,
    /// Upper bound on joint download/verify passes.
    pub max_passes: u32,
    /// Optional timeouts; if missing, built-in defaults are used.
    pub transfer: Option<TransferConfig>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            checksum_suffix: DEFAULT_CHECKSUM_SUFFIX.to_string(),
            checksum_pattern: DEFAULT_CHECKSUM_PATTERN.to_string(),
            hash_algorithm: HashAlgorithm::Md5,
            download_concurrency: DOWNLOAD_CONCURRENCY,
            verify_concurrency: VERIFY_CONCURRENCY,
            max_retries: MAX_RETRIES,
            progress_interval_ms: 500,
            max_passes: DEFAULT_MAX_PASSES,
            transfer: None,
        }
    }
}

impl MirrorConfig {
    /// Parsed base URL, always ending in `/` so filenames join beneath it.
    pub fn base_url(&self) -> Result<Url> {
        parse_base_url(&self.base_url)
    }

    /// Compiled `file_pattern`.
    pub fn file_regex(&self) -> Result<Regex> {
        Regex::new(&self.file_pattern)
            .with_context(|| format!("invalid file_pattern: {}", self.file_pattern))
    }

    pub fn transfer_config(&self) -> TransferConfig {
        self.transfer.clone().unwrap_or_default()
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

/// Parse a directory URL, appending the trailing `/` that `Url::join` relies on.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).with_context(|| format!("invalid base_url: {}", raw))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mirrorsync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MirrorConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MirrorConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<MirrorConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: MirrorConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = MirrorConfig::default();
        assert_eq!(cfg.download_concurrency, 10);
        assert_eq!(cfg.verify_concurrency, 5);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.hash_algorithm, HashAlgorithm::Md5);
        assert!(cfg.transfer.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = MirrorConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: MirrorConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.base_url, cfg.base_url);
        assert_eq!(parsed.file_pattern, cfg.file_pattern);
        assert_eq!(parsed.checksum_pattern, cfg.checksum_pattern);
        assert_eq!(parsed.max_passes, cfg.max_passes);
    }

    #[test]
    fn config_toml_partial_uses_defaults() {
        let toml = r#"
            base_url = "http://mirror.test/data"
            download_concurrency = 2
            hash_algorithm = "sha256"
        "#;
        let cfg: MirrorConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.download_concurrency, 2);
        assert_eq!(cfg.verify_concurrency, 5);
        assert_eq!(cfg.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(cfg.base_url().unwrap().as_str(), "http://mirror.test/data/");
    }

    #[test]
    fn config_toml_transfer_section() {
        let toml = r#"
            [transfer]
            connect_timeout_secs = 5
            low_speed_limit_bytes = 10
            low_speed_time_secs = 15
        "#;
        let cfg: MirrorConfig = toml::from_str(toml).unwrap();
        let t = cfg.transfer_config();
        assert_eq!(t.connect_timeout(), Duration::from_secs(5));
        assert_eq!(t.low_speed_limit_bytes, 10);
        assert_eq!(t.low_speed_time(), Duration::from_secs(15));
    }

    #[test]
    fn invalid_file_pattern_is_an_error() {
        let cfg = MirrorConfig {
            file_pattern: "(".to_string(),
            ..MirrorConfig::default()
        };
        assert!(cfg.file_regex().is_err());
    }

    #[test]
    fn load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_passes = 2\n").unwrap();
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.max_passes, 2);
        assert_eq!(cfg.file_pattern, DEFAULT_FILE_PATTERN);
    }
}
