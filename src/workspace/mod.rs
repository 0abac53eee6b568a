//! Build workspaces and the locks that make them exclusive.
//!
//! Each (repository, source version) pair owns one workspace directory:
//!
//! ```text
//! ~/.srcdeps/build/
//! ├── org/example/                    # repository id as a path
//! │   ├── 1.0/branch-main/            # workspace for 1.0-SRC-branch-main
//! │   ├── 2.0/branch-main/            # workspace for 2.0-SRC-branch-main
//! │   └── 1.2.3/tag-v1.2.3/
//! └── .locks/org/example/
//!     └── 1.0/branch-main.lock        # cross-process lock file
//! ```
//!
//! Whoever holds the [`PathLock`] for a workspace is the only one building in it.
//! That lock is the single serialisation point for source builds: callers asking
//! for the same workspace queue up, callers asking for different workspaces never
//! wait on each other.
//!
//! ```text
//! Task A: open("org/example", 1.0-SRC-branch-main) ───┐
//!                                                     ├─── BLOCKS: same workspace
//! Task B: open("org/example", 1.0-SRC-branch-main) ───┘
//!
//! Task C: open("org/example", 2.0-SRC-branch-main) ──── CONCURRENT: different workspace
//! ```

mod lock;

pub use lock::WorkspaceFileLock;

use dashmap::DashMap;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::constants::ENV_BUILD_ROOT;
use crate::core::{FileOperation, FileResultExt, SrcdepsError};
use crate::utils::platform::{default_build_root, resolve_path};
use crate::version::SourceVersion;

/// Hands out exclusive build workspaces.
#[async_trait]
pub trait BuildDirectoriesManager: Send + Sync {
    /// Open the workspace for `repo_id_path` at `version`, waiting until no one
    /// else holds it.
    ///
    /// The workspace stays exclusively owned until the returned [`PathLock`] is
    /// dropped.
    async fn open_build_directory(
        &self,
        repo_id_path: &Path,
        version: &SourceVersion,
    ) -> Result<PathLock, SrcdepsError>;
}

/// Exclusive hold over a workspace directory, released on drop.
pub struct PathLock {
    path: PathBuf,
    _guard: Box<dyn Send + Sync>,
}

impl PathLock {
    /// Tie `path` to `guard`; whatever `guard` holds is released when the lock drops.
    pub fn new(path: PathBuf, guard: impl Send + Sync + 'static) -> Self {
        Self {
            path,
            _guard: Box::new(guard),
        }
    }

    /// The workspace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for PathLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathLock").field("path", &self.path).finish_non_exhaustive()
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        tracing::debug!(target: "srcdeps", "Releasing build directory {}", self.path.display());
    }
}

type InProcessLocks = DashMap<PathBuf, Arc<Mutex<()>>>;

/// Workspaces under a root directory, locked in-process and across processes.
///
/// Callers in this process queue on a per-workspace async mutex first, so at
/// most one of them at a time waits on the OS file lock that excludes other
/// processes.
#[derive(Debug, Clone)]
pub struct LockingBuildDirectories {
    root: PathBuf,
    in_process: Arc<InProcessLocks>,
}

impl LockingBuildDirectories {
    /// Workspaces under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            in_process: Arc::new(DashMap::new()),
        }
    }

    /// Workspaces under `SRCDEPS_BUILD_ROOT`, or `~/.srcdeps/build`.
    pub fn user_default() -> anyhow::Result<Self> {
        let root = match std::env::var(ENV_BUILD_ROOT) {
            Ok(dir) => resolve_path(&dir)?,
            Err(_) => default_build_root()?,
        };
        Ok(Self::new(root))
    }

    /// The root of all workspaces.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of workspaces currently held or waited for in this process.
    #[cfg(test)]
    fn active_workspaces(&self) -> usize {
        self.in_process.len()
    }

    async fn open(&self, workspace_dir: &Path) -> Result<PathLock, SrcdepsError> {
        let workspace = self.root.join(workspace_dir);
        // Clone the Arc out so the map shard is not locked while we wait.
        let mutex = self
            .in_process
            .entry(workspace.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        tracing::debug!(target: "srcdeps", "Waiting for build directory {}", workspace.display());
        let slot = InProcessSlot {
            locks: self.in_process.clone(),
            key: workspace.clone(),
            guard: Some(mutex.lock_owned().await),
        };
        let file_lock = WorkspaceFileLock::acquire(&WorkspaceFileLock::lock_path(&self.root, workspace_dir)).await?;

        tokio::fs::create_dir_all(&workspace).await.with_file_context(
            FileOperation::CreateDir,
            &workspace,
            "creating build directory",
            "workspace::LockingBuildDirectories::open",
        )?;

        tracing::debug!(target: "srcdeps", "Acquired build directory {}", workspace.display());
        // Release order: the file lock first, then the in-process slot.
        Ok(PathLock::new(workspace, (file_lock, slot)))
    }
}

/// In-process hold on one workspace; forgets the workspace's mutex once nobody
/// holds or waits for it.
struct InProcessSlot {
    locks: Arc<InProcessLocks>,
    key: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for InProcessSlot {
    fn drop(&mut self) {
        // The guard keeps its own reference to the mutex; release it before counting.
        drop(self.guard.take());
        // Waiters clone the Arc under the shard lock, so a count of one is only the map's.
        self.locks.remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[async_trait]
impl BuildDirectoriesManager for LockingBuildDirectories {
    async fn open_build_directory(
        &self,
        repo_id_path: &Path,
        version: &SourceVersion,
    ) -> Result<PathLock, SrcdepsError> {
        self.open(&repo_id_path.join(version.workspace_dir())).await
    }
}
