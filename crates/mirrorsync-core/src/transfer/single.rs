//! Single-stream GET into a temp file, renamed into place on success.

use std::cell::Cell;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::{configure_handle, parse_content_length};
use crate::config::TransferConfig;
use crate::retry::TransferError;
use crate::scheduler::ProgressReporter;
use crate::storage;

/// Downloads `url` to `dest` (via `dest.part`), reporting cumulative bytes to `progress`.
/// Returns the number of bytes written. Runs in the current thread; call from
/// `spawn_blocking` if used from async code.
pub fn download_to_path(
    url: &str,
    dest: &Path,
    config: &TransferConfig,
    progress: &ProgressReporter,
) -> Result<u64, TransferError> {
    let temp = storage::temp_path(dest);
    match stream_into(url, &temp, config, progress) {
        Ok(written) => {
            storage::finalize(&temp, dest)?;
            Ok(written)
        }
        Err(e) => {
            storage::discard(&temp);
            Err(e)
        }
    }
}

fn stream_into(
    url: &str,
    temp: &Path,
    config: &TransferConfig,
    progress: &ProgressReporter,
) -> Result<u64, TransferError> {
    let mut file = File::create(temp)?;

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    configure_handle(&mut easy, config)?;

    let content_length: Cell<Option<u64>> = Cell::new(None);
    let mut written: u64 = 0;
    let mut write_error: Option<std::io::Error> = None;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(line) = std::str::from_utf8(data) {
                // A new status line starts a new response (redirect hop).
                if line.starts_with("HTTP/") {
                    content_length.set(None);
                } else if let Some(n) = parse_content_length(line) {
                    content_length.set(Some(n));
                }
            }
            true
        })?;
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                progress.report(written, content_length.get());
                Ok(data.len())
            }
            Err(e) => {
                write_error = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };

    if let Some(e) = write_error {
        return Err(TransferError::Storage(e));
    }
    let code = easy.response_code()?;
    if let Err(e) = performed {
        if code >= 400 {
            return Err(TransferError::Http(code));
        }
        return Err(TransferError::Curl(e));
    }
    if !(200..300).contains(&code) {
        return Err(TransferError::Http(code));
    }
    if let Some(expected) = content_length.get() {
        if written != expected {
            return Err(TransferError::PartialTransfer {
                expected,
                received: written,
            });
        }
    }

    file.sync_all()?;
    tracing::debug!(url, bytes = written, "transfer complete");
    Ok(written)
}
