//! Cross-process file locks for build workspaces.
//!
//! The lock is an OS-level exclusive lock on a file under `<root>/.locks/` whose
//! relative path mirrors the workspace, held for as long as the
//! [`WorkspaceFileLock`] value lives. The lock file itself is left in place after
//! release.

use fs4::fs_std::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::constants::{LOCK_FILE_EXTENSION, LOCKS_DIR_NAME};
use crate::core::{FileOperation, FileResultExt, SrcdepsError};

/// An exclusive file lock guarding one build workspace.
#[derive(Debug)]
pub struct WorkspaceFileLock {
    file: File,
    path: PathBuf,
}

impl WorkspaceFileLock {
    /// Path of the lock file guarding the workspace at `root/workspace_dir`.
    #[must_use]
    pub fn lock_path(root: &Path, workspace_dir: &Path) -> PathBuf {
        let mut path = OsString::from(root.join(LOCKS_DIR_NAME).join(workspace_dir));
        path.push(".");
        path.push(LOCK_FILE_EXTENSION);
        PathBuf::from(path)
    }

    /// Acquire the exclusive lock at `lock_path`, waiting as long as it takes.
    ///
    /// The blocking lock call runs on tokio's blocking pool so other tasks keep
    /// making progress while this one waits.
    pub async fn acquire(lock_path: &Path) -> Result<Self, SrcdepsError> {
        let lock_path = lock_path.to_path_buf();
        if let Some(parent) = lock_path.parent() {
            tokio::fs::create_dir_all(parent).await.with_file_context(
                FileOperation::CreateDir,
                parent,
                "creating lock directory",
                "workspace::lock::acquire",
            )?;
        }

        let path = lock_path.clone();
        let file = tokio::task::spawn_blocking(move || -> Result<File, SrcdepsError> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .with_file_context(
                    FileOperation::Write,
                    &path,
                    "opening workspace lock file",
                    "workspace::lock::acquire",
                )?;

            file.lock_exclusive().with_file_context(
                FileOperation::Lock,
                &path,
                "acquiring workspace lock",
                "workspace::lock::acquire",
            )?;
            Ok(file)
        })
        .await
        .map_err(|e| SrcdepsError::LockFailed {
            path: lock_path.display().to_string(),
            reason: format!("lock task failed: {e}"),
        })??;

        tracing::trace!(target: "srcdeps", "Locked {}", lock_path.display());
        Ok(Self {
            file,
            path: lock_path,
        })
    }

    /// The lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkspaceFileLock {
    fn drop(&mut self) {
        // Closing the file releases the lock as well; unlock explicitly to be prompt.
        #[allow(unstable_name_collisions)]
        if let Err(e) = self.file.unlock() {
            tracing::warn!(target: "srcdeps", "Failed to unlock {}: {}", self.path.display(), e);
        } else {
            tracing::trace!(target: "srcdeps", "Unlocked {}", self.path.display());
        }
    }
}
