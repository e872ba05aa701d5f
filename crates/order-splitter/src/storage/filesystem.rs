use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::OverwritePolicy;
use crate::error::StorageError;

/// Move a file from `src` to `dst`, replacing `dst`. Uses `rename` first
/// (atomic on the same filesystem) and falls back to copy + delete for
/// cross-device moves.
pub fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

pub fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Temp path next to `path`, so the final rename stays on one filesystem.
pub fn sibling_temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}

/// Writes run artifacts under an output root, honouring the overwrite policy.
pub struct FileStorage {
    output_directory: PathBuf,
    policy: OverwritePolicy,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(output_directory: P, policy: OverwritePolicy) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
            policy,
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn policy(&self) -> OverwritePolicy {
        self.policy
    }

    /// Writes `content` to `{output_directory}/{relative_directory}/{filename}`.
    pub fn store(
        &self,
        content: &[u8],
        relative_directory: &str,
        filename: &str,
    ) -> Result<PathBuf, StorageError> {
        let dir_path = self.output_directory.join(relative_directory);
        ensure_directory(&dir_path)?;

        let file_path = dir_path.join(filename);
        match self.policy {
            OverwritePolicy::LastWriteWins => {
                std::fs::write(&file_path, content).map_err(|e| StorageError::WriteFile {
                    path: file_path.clone(),
                    source: e,
                })?;
            }
            OverwritePolicy::FailOnConflict => {
                Self::store_exclusive(&file_path, content)?;
            }
        }

        Ok(file_path)
    }

    /// Writes to a temp sibling, then renames over the target so readers
    /// never observe a half-written file under the final name.
    pub fn store_atomic(
        &self,
        content: &[u8],
        relative_directory: &str,
        filename: &str,
    ) -> Result<PathBuf, StorageError> {
        let dir_path = self.output_directory.join(relative_directory);
        ensure_directory(&dir_path)?;

        let file_path = dir_path.join(filename);
        self.check_conflict(&file_path)?;

        let temp_path = sibling_temp_path(&file_path);
        std::fs::write(&temp_path, content).map_err(|e| StorageError::WriteFile {
            path: temp_path.clone(),
            source: e,
        })?;
        if let Err(e) = move_file(&temp_path, &file_path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }

        Ok(file_path)
    }

    /// Fails with `FileExists` when the policy forbids replacing `path`.
    pub fn check_conflict(&self, path: &Path) -> Result<(), StorageError> {
        if self.policy == OverwritePolicy::FailOnConflict
            && std::fs::symlink_metadata(path).is_ok()
        {
            return Err(StorageError::FileExists(path.to_path_buf()));
        }
        Ok(())
    }

    /// Creates the file with O_EXCL so a concurrent writer cannot slip in
    /// between the existence check and the write.
    fn store_exclusive(path: &Path, content: &[u8]) -> Result<(), StorageError> {
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(mut file) => file.write_all(content).map_err(|e| StorageError::WriteFile {
                path: path.to_path_buf(),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StorageError::FileExists(path.to_path_buf()))
            }
            Err(e) => Err(StorageError::WriteFile {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}
