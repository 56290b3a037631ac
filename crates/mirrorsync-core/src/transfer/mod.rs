//! Curl-backed transfer engine.
//!
//! Each transfer is a single GET that restarts from byte zero; libcurl runs on
//! the blocking pool and reports cumulative bytes back to the pipeline through
//! the task's progress reporter.

mod fetch;
mod single;

pub use fetch::fetch_text;
pub use single::download_to_path;

use std::path::Path;

use crate::config::TransferConfig;
use crate::retry::TransferError;
use crate::scheduler::{ProgressReporter, TransferEngine};

/// Transfer engine that streams one URL to a local file with libcurl.
#[derive(Debug, Clone, Default)]
pub struct CurlTransfer {
    config: TransferConfig,
}

impl CurlTransfer {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }
}

impl TransferEngine for CurlTransfer {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: ProgressReporter,
    ) -> Result<u64, TransferError> {
        let url = url.to_string();
        let dest = dest.to_path_buf();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || download_to_path(&url, &dest, &config, &progress))
            .await
            .map_err(|e| TransferError::Worker(e.to_string()))?
    }
}

/// Apply redirect handling and configured timeouts to a handle.
pub(crate) fn configure_handle(
    easy: &mut curl::easy::Easy,
    config: &TransferConfig,
) -> Result<(), curl::Error> {
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(config.connect_timeout())?;
    easy.low_speed_limit(config.low_speed_limit_bytes)?;
    easy.low_speed_time(config.low_speed_time())?;
    Ok(())
}

/// Value of a `Content-Length` header line, if that is what `line` is.
pub(crate) fn parse_content_length(line: &str) -> Option<u64> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_length_header() {
        assert_eq!(parse_content_length("Content-Length: 12345\r\n"), Some(12345));
        assert_eq!(parse_content_length("content-length:7"), Some(7));
        assert_eq!(parse_content_length("Content-Type: text/html"), None);
        assert_eq!(parse_content_length("Content-Length: lots"), None);
        assert_eq!(parse_content_length("HTTP/1.1 200 OK"), None);
    }
}
