use std::io::Write;
use std::path::Path;

use crate::classifier::ErrorEntry;
use crate::error::StorageError;
use crate::storage::filesystem::ensure_directory;

/// Appends one `"{timestamp} - {message}"` line per entry. The file is opened
/// in append mode and never truncated.
pub fn append_error_log(path: &Path, entries: &[ErrorEntry]) -> Result<(), StorageError> {
    if entries.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let write_error = |source: std::io::Error| StorageError::WriteFile {
        path: path.to_path_buf(),
        source,
    };

    let mut buffer = String::new();
    for entry in entries {
        buffer.push_str(&entry.to_log_line());
        buffer.push('\n');
    }

    // One write per run keeps lines from concurrent runs from interleaving.
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_error)?;
    file.write_all(buffer.as_bytes()).map_err(write_error)?;
    Ok(())
}
