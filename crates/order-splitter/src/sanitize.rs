//! Helpers for making user-supplied strings safe for file names and for
//! tracing span attributes.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Makes a vendor name usable as part of a single file name.
///
/// Path separators, characters Windows rejects, and control characters become
/// `_`. Surrounding whitespace is trimmed. Other characters, dots included,
/// are kept; a result of `.`, `..` or nothing becomes `unknown`.
pub fn sanitize_file_component(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match replaced.trim() {
        "" | "." | ".." => "unknown".to_string(),
        trimmed => trimmed.to_string(),
    }
}
