//! Small in-memory GETs (directory listings, checksum resources).

use super::configure_handle;
use crate::config::TransferConfig;
use crate::retry::TransferError;

/// Upper bound on an in-memory body; listings and checksum files are far smaller.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// GET `url` and return the body as text (lossy UTF-8). Fails on transport
/// errors and non-2xx responses. Runs in the current thread.
pub fn fetch_text(url: &str, config: &TransferConfig) -> Result<String, TransferError> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    configure_handle(&mut easy, config)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            if body.len() + data.len() > MAX_BODY_BYTES {
                return Ok(0);
            }
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()
    };

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
    Ok(String::from_utf8_lossy(&body).into_owned())
}
