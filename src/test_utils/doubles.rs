//! In-memory stand-ins for the store, finder, workspace manager and build service.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::build::{BuildRequest, BuildService};
use crate::config::{RepositoryFinder, ScmRepository};
use crate::core::SrcdepsError;
use crate::store::LocalStore;
use crate::version::SourceVersion;
use crate::workspace::{BuildDirectoriesManager, PathLock};

/// A repository serving `selectors`, cloned from a fake GitHub URL derived from `id`.
#[must_use]
pub fn sample_repository(id: &str, selectors: &[&str]) -> ScmRepository {
    ScmRepository::new(
        id,
        selectors.iter().map(ToString::to_string).collect(),
        vec![format!("git:https://github.com/example/{id}.git")],
    )
}

/// A [`LocalStore`] backed by a set of `group:artifact:version` strings.
#[derive(Debug)]
pub struct InMemoryStore {
    root: PathBuf,
    present: Mutex<HashSet<String>>,
    probes: AtomicUsize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// An empty store with a made-up root directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root("/srcdeps-test/m2/repository")
    }

    /// An empty store reporting `root` as its root directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            present: Mutex::new(HashSet::new()),
            probes: AtomicUsize::new(0),
        }
    }

    /// Mark `group:artifact:version` as present.
    pub fn insert(&self, group: &str, artifact: &str, version: &str) {
        self.present.lock().unwrap().insert(format!("{group}:{artifact}:{version}"));
    }

    /// How many times [`LocalStore::contains`] was called.
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl LocalStore for InMemoryStore {
    fn contains(&self, group: &str, artifact: &str, version: &str) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.present.lock().unwrap().contains(&format!("{group}:{artifact}:{version}"))
    }

    fn root_directory(&self) -> &Path {
        &self.root
    }
}

/// A [`RepositoryFinder`] returning one fixed repository, or nothing.
#[derive(Debug)]
pub struct StubFinder {
    repository: Option<ScmRepository>,
    lookups: AtomicUsize,
}

impl StubFinder {
    /// Always find `repository`.
    #[must_use]
    pub fn returning(repository: ScmRepository) -> Self {
        Self {
            repository: Some(repository),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Never find anything.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            repository: None,
            lookups: AtomicUsize::new(0),
        }
    }

    /// How many lookups were made.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl RepositoryFinder for StubFinder {
    fn find_repository(&self, group: &str, artifact: &str, version: &str) -> Result<ScmRepository, SrcdepsError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.repository.clone().ok_or_else(|| SrcdepsError::RepositoryNotFound {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
        })
    }
}

/// Counts calls to a wrapped [`BuildDirectoriesManager`].
#[derive(Debug)]
pub struct CountingDirectories<D> {
    inner: D,
    opens: AtomicUsize,
}

impl<D> CountingDirectories<D> {
    /// Wrap `inner`.
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            opens: AtomicUsize::new(0),
        }
    }

    /// How many workspaces were requested.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<D: BuildDirectoriesManager> BuildDirectoriesManager for CountingDirectories<D> {
    async fn open_build_directory(
        &self,
        repo_id_path: &Path,
        version: &SourceVersion,
    ) -> Result<PathLock, SrcdepsError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open_build_directory(repo_id_path, version).await
    }
}

/// A [`BuildService`] that records requests and optionally "installs" artifacts
/// into an [`InMemoryStore`].
///
/// Installed coordinates use the requested source version, so one service can
/// serve several versions of the same artifacts.
#[derive(Debug, Default)]
pub struct FakeBuildService {
    store: Option<Arc<InMemoryStore>>,
    installs: Vec<(String, String)>,
    delay: Duration,
    failure: Option<String>,
    builds: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<BuildRequest>>,
}

impl FakeBuildService {
    /// Succeeds without installing anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `group:artifact:<requested version>` into `store` on every build.
    pub fn installing(store: Arc<InMemoryStore>, group: &str, artifact: &str) -> Self {
        Self {
            store: Some(store),
            installs: vec![(group.to_string(), artifact.to_string())],
            ..Self::default()
        }
    }

    /// Also install `group:artifact`.
    #[must_use]
    pub fn also_installing(mut self, group: &str, artifact: &str) -> Self {
        self.installs.push((group.to_string(), artifact.to_string()));
        self
    }

    /// Fails every build with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Take `delay` per build.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of builds started.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Highest number of builds that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<BuildRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildService for FakeBuildService {
    async fn build(&self, request: &BuildRequest) -> Result<(), SrcdepsError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(SrcdepsError::BuildFailed {
                operation: "fake build".to_string(),
                reason: reason.clone(),
            });
        }
        if let Some(store) = &self.store {
            for (group, artifact) in &self.installs {
                store.insert(group, artifact, request.src_version().as_str());
            }
        }
        Ok(())
    }
}
