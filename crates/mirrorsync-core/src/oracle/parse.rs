//! Pull the expected hash out of a checksum resource body.

use regex::Regex;

/// Hash captured by the `hash` group, lowercased.
///
/// A resource listing several files (a `SHA256SUMS`-style file) is handled by
/// preferring the match whose line mentions `filename`; otherwise the first
/// match wins.
pub fn extract_hash(body: &str, pattern: &Regex, filename: &str) -> Option<String> {
    let mut first = None;
    for caps in pattern.captures_iter(body) {
        let Some(hash) = caps.name("hash") else {
            continue;
        };
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        if !filename.is_empty() && whole.contains(filename) {
            return Some(hash.as_str().to_ascii_lowercase());
        }
        if first.is_none() {
            first = Some(hash.as_str().to_ascii_lowercase());
        }
    }
    first
}
