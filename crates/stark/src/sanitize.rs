//! Helpers for cleaning client-supplied names and keeping paths out of logs.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RE_UNSAFE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields; reveals file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Reduces a client-supplied filename to a form that is safe to join onto a
/// directory.
///
/// - the name is NFKD-normalized, so accented letters keep their base letter
/// - remaining non-ASCII and control characters are dropped
/// - path separators become word breaks, whitespace runs become `_`
/// - anything outside `[A-Za-z0-9_.-]` is removed
/// - leading and trailing `.`/`_` are stripped, so `..` collapses to nothing
///
/// The result may be empty; callers must reject that.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name
        .nfkd()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = RE_UNSAFE.replace_all(&joined, "");

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}
