//! Extract filenames from a listing body.

use regex::Regex;
use std::collections::BTreeSet;

/// `pattern` anchored at both ends, so `is_match` means the whole name matched.
pub fn anchored(pattern: &Regex) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern.as_str()))
}

/// A filename that stays inside the mirror directory when joined onto it.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// Every distinct, safe match of `pattern` in `body`, sorted.
pub fn extract_filenames(body: &str, pattern: &Regex) -> BTreeSet<String> {
    pattern
        .find_iter(body)
        .map(|m| m.as_str())
        .filter(|name| is_safe_filename(name))
        .map(str::to_string)
        .collect()
}
