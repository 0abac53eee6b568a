//! Local artifact store probes.
//!
//! The build coordinator never reads or writes artifacts itself; it only asks
//! whether a coordinate is already present (before locking, after locking, and
//! after building) and where the store lives, so the nested build can be
//! pointed at it. [`LocalStore`] is that capability; [`MavenLocalStore`] is the
//! implementation for the Maven repository layout:
//!
//! ```text
//! ~/.m2/repository/
//! └── org/example/          # group, one directory per dot-separated segment
//!     └── foo/              # artifact
//!         └── 1.2.3-SRC-branch-main/   # version
//! ```

use std::path::{Path, PathBuf};

use crate::config::id_as_path;
use crate::constants::ENV_MAVEN_REPO_LOCAL;
use crate::core::SrcdepsError;
use crate::utils::platform::{get_home_dir, resolve_path};

/// Existence checks against an artifact store.
pub trait LocalStore: Send + Sync {
    /// Whether `group:artifact:version` is present.
    ///
    /// Never fails: anything that cannot be inspected counts as absent.
    fn contains(&self, group: &str, artifact: &str, version: &str) -> bool;

    /// Root directory of the store.
    fn root_directory(&self) -> &Path;
}

/// A store using the Maven local repository layout.
///
/// Presence means the version *directory* exists. A partially written or stale
/// directory therefore counts as present; no artifact files are inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenLocalStore {
    root: PathBuf,
}

impl MavenLocalStore {
    /// A store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// A store from a `file://` URI.
    pub fn from_uri(uri: &str) -> Result<Self, SrcdepsError> {
        let path = uri.strip_prefix("file://").ok_or_else(|| SrcdepsError::ConfigurationUnavailable {
            path: uri.to_string(),
            reason: "expected scheme file in local repository URI".to_string(),
        })?;
        Ok(Self::new(path))
    }

    /// The user's local repository: `SRCDEPS_MAVEN_REPO_LOCAL` if set,
    /// otherwise `~/.m2/repository`.
    pub fn user_default() -> anyhow::Result<Self> {
        if let Ok(dir) = std::env::var(ENV_MAVEN_REPO_LOCAL) {
            return Ok(Self::new(resolve_path(&dir)?));
        }
        Ok(Self::new(get_home_dir()?.join(".m2").join("repository")))
    }

    /// Directory that holds `group:artifact:version`.
    #[must_use]
    pub fn version_directory(&self, group: &str, artifact: &str, version: &str) -> PathBuf {
        self.root.join(id_as_path(group)).join(artifact).join(version)
    }
}

impl LocalStore for MavenLocalStore {
    fn contains(&self, group: &str, artifact: &str, version: &str) -> bool {
        let path = self.version_directory(group, artifact, version);
        let present = path.is_dir();
        tracing::trace!(
            target: "srcdeps",
            "{}:{}:{} {} in {}",
            group,
            artifact,
            version,
            if present { "present" } else { "absent" },
            self.root.display()
        );
        present
    }

    fn root_directory(&self) -> &Path {
        &self.root
    }
}
