use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::error::StorageError;

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// A lock file older than this is left over from a crashed run.
const STALE_LOCK_AGE: Duration = Duration::from_secs(300);

/// Advisory lock guarding a read-modify-write of a shared log file.
///
/// The lock is a sibling file created with O_EXCL, so it serializes writers
/// across threads and processes alike. It is removed on drop.
#[derive(Debug)]
pub struct AuditLock {
    path: PathBuf,
}

impl AuditLock {
    /// Lock file path for `target` (`<target>.lock`).
    pub fn lock_path(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        target.with_file_name(name)
    }

    pub fn acquire(target: &Path, timeout: Duration) -> Result<Self, StorageError> {
        let path = Self::lock_path(target);
        let deadline = Instant::now() + timeout;

        loop {
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{}", std::process::id()) {
                        tracing::debug!(
                            lock = %path.display(),
                            error = %e,
                            "Failed to record PID in audit lock"
                        );
                    }
                    tracing::trace!(lock = %path.display(), "Acquired audit lock");
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if Self::is_stale(&path) && Self::break_stale(&path) {
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(StorageError::LockTimeout(path));
                    }
                    std::thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => {
                    return Err(StorageError::WriteFile { path, source: e });
                }
            }
        }
    }

    fn is_stale(path: &Path) -> bool {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age > STALE_LOCK_AGE)
    }

    /// Moves a stale lock aside before deleting it. Only the waiter whose
    /// rename succeeds deletes anything, and a lock that turns out to be fresh
    /// once moved is linked back into place. Returns whether a stale lock was
    /// removed.
    fn break_stale(path: &Path) -> bool {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.stale", uuid::Uuid::new_v4().simple()));
        let aside = path.with_file_name(name);

        if std::fs::rename(path, &aside).is_err() {
            return false;
        }

        let stale = Self::is_stale(&aside);
        if stale {
            tracing::warn!(lock = %path.display(), "Removed stale audit lock");
        } else if let Err(e) = std::fs::hard_link(&aside, path) {
            tracing::warn!(
                lock = %path.display(),
                error = %e,
                "Failed to restore live audit lock"
            );
        }
        if let Err(e) = std::fs::remove_file(&aside) {
            tracing::debug!(
                lock = %aside.display(),
                error = %e,
                "Failed to remove moved audit lock"
            );
        }
        stale
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AuditLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
