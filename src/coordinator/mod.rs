//! Deciding whether a source dependency must be built, and building it at most once.
//!
//! [`BuildCoordinator::build_if_necessary`] is called for every requested
//! dependency whose version is a source version, possibly from many tasks at
//! once. It probes the local store three times:
//!
//! ```text
//! skip? ──yes──> Skipped
//!   │
//! probe 1 (unlocked) ──present──> AlreadyAvailable
//!   │
//! find repository, parse version      (errors propagate)
//!   │
//! lock workspace (repo id path, version)   ─┐
//!   │                                       │
//! probe 2 ──present──> BuiltConcurrently    │ failures here are logged
//!   │                                       │ and become Failed
//! compose request, build                    │
//!   │                                       │
//! probe 3 ──absent──> Inconsistent          │
//!   │                                       │
//! Built                                    ─┘ lock released
//! ```
//!
//! The workspace lock is the only thing that serialises builds: two callers
//! for the same repository and version queue on it, and the second one finds
//! the artifact already installed by the first at probe 2.

mod arguments;

pub use arguments::enhance_build_arguments;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::build::{BuildRequest, BuildService, IoRedirects};
use crate::config::{Configuration, ConfigurationService, RepositoryFinder, ScmRepository};
use crate::core::SrcdepsError;
use crate::store::LocalStore;
use crate::version::SourceVersion;
use crate::workspace::BuildDirectoriesManager;

/// What [`BuildCoordinator::build_if_necessary`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Source builds are disabled by configuration
    Skipped,
    /// The artifact was already in the local store
    AlreadyAvailable,
    /// Another caller built the artifact while this one waited for the lock
    BuiltConcurrently,
    /// The artifact was built and is now in the local store
    Built,
    /// The build reported success but the artifact is still missing
    Inconsistent,
    /// Locking, request composition or the build itself failed
    Failed {
        /// Description of the failure
        reason: String,
    },
}

impl BuildOutcome {
    /// Whether the artifact can be expected in the local store afterwards.
    ///
    /// `Skipped` is not counted: nothing was checked.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::AlreadyAvailable | Self::BuiltConcurrently | Self::Built)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => write!(f, "skipped"),
            Self::AlreadyAvailable => write!(f, "already available"),
            Self::BuiltConcurrently => write!(f, "built concurrently"),
            Self::Built => write!(f, "built"),
            Self::Inconsistent => write!(f, "built but not available"),
            Self::Failed {
                reason,
            } => write!(f, "failed: {reason}"),
        }
    }
}

/// Builds source dependencies on demand.
///
/// Holds no mutable state of its own; share it behind an `Arc` between
/// resolution tasks.
pub struct BuildCoordinator {
    configuration: Arc<Configuration>,
    configuration_location: PathBuf,
    finder: Arc<dyn RepositoryFinder>,
    directories: Arc<dyn BuildDirectoriesManager>,
    build_service: Arc<dyn BuildService>,
    store: Arc<dyn LocalStore>,
}

impl BuildCoordinator {
    /// Assemble a coordinator from its collaborators.
    pub fn new(
        configuration: Arc<Configuration>,
        configuration_location: impl Into<PathBuf>,
        finder: Arc<dyn RepositoryFinder>,
        directories: Arc<dyn BuildDirectoriesManager>,
        build_service: Arc<dyn BuildService>,
        store: Arc<dyn LocalStore>,
    ) -> Self {
        Self {
            configuration,
            configuration_location: configuration_location.into(),
            finder,
            directories,
            build_service,
            store,
        }
    }

    /// A coordinator using the configuration and repository finder of `service`.
    pub fn from_configuration_service(
        service: &ConfigurationService,
        directories: Arc<dyn BuildDirectoriesManager>,
        build_service: Arc<dyn BuildService>,
        store: Arc<dyn LocalStore>,
    ) -> Self {
        Self::new(
            service.configuration(),
            service.location(),
            service.repository_finder(),
            directories,
            build_service,
            store,
        )
    }

    /// The configuration in use.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Make sure `group:artifact:version` is in the local store, building it
    /// from source if needed.
    ///
    /// # Errors
    ///
    /// [`SrcdepsError::RepositoryNotFound`] when no repository serves the
    /// coordinate and [`SrcdepsError::InvalidSourceVersion`] when `version`
    /// cannot be parsed. Everything that goes wrong while the workspace is
    /// locked is logged and reported as [`BuildOutcome::Failed`].
    pub async fn build_if_necessary(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> Result<BuildOutcome, SrcdepsError> {
        if self.configuration.skip {
            tracing::debug!(target: "srcdeps", "Source builds are skipped, not building {}:{}:{}", group, artifact, version);
            return Ok(BuildOutcome::Skipped);
        }

        if self.store.contains(group, artifact, version) {
            tracing::debug!(target: "srcdeps", "{}:{}:{} is already available", group, artifact, version);
            return Ok(BuildOutcome::AlreadyAvailable);
        }

        let repository = self.finder.find_repository(group, artifact, version)?;
        let src_version = SourceVersion::parse(version)?;

        match self.build_locked(group, artifact, version, &repository, src_version).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let reason = describe(&e);
                tracing::error!(
                    target: "srcdeps",
                    "Srcdeps could not build {}:{}:{}: {}",
                    group,
                    artifact,
                    version,
                    reason
                );
                Ok(BuildOutcome::Failed {
                    reason,
                })
            }
        }
    }

    async fn build_locked(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        repository: &ScmRepository,
        src_version: SourceVersion,
    ) -> Result<BuildOutcome, SrcdepsError> {
        let lock = self.directories.open_build_directory(&repository.id_as_path(), &src_version).await?;

        // Things may have changed while we waited for the lock
        if self.store.contains(group, artifact, version) {
            tracing::debug!(
                target: "srcdeps",
                "{}:{}:{} was built while waiting for {}",
                group,
                artifact,
                version,
                lock.path().display()
            );
            return Ok(BuildOutcome::BuiltConcurrently);
        }

        let request = self.compose_request(lock.path(), repository, src_version)?;
        tracing::info!(
            target: "srcdeps",
            "Building {}:{}:{} from repository '{}'",
            group,
            artifact,
            version,
            repository.id
        );
        self.build_service.build(&request).await?;

        if !self.store.contains(group, artifact, version) {
            tracing::error!(
                target: "srcdeps",
                "Srcdeps build succeeded but the artifact {}:{}:{} is still not available in the local repository",
                group,
                artifact,
                version
            );
            return Ok(BuildOutcome::Inconsistent);
        }

        Ok(BuildOutcome::Built)
    }

    fn compose_request(
        &self,
        workspace: &Path,
        repository: &ScmRepository,
        src_version: SourceVersion,
    ) -> Result<BuildRequest, SrcdepsError> {
        let io_redirects = IoRedirects::from_builder_io(&repository.builder_io)?;
        let build_arguments = enhance_build_arguments(
            &repository.build_arguments,
            &self.configuration_location,
            self.store.root_directory(),
        );

        BuildRequest::builder()
            .project_root_directory(workspace)
            .scm_urls(repository.urls.clone())
            .src_version(src_version)
            .build_arguments(build_arguments)
            .timeout(repository.build_timeout)
            .skip_tests(repository.skip_tests)
            .forward_properties(self.configuration.forward_properties.clone())
            .add_default_build_arguments(repository.add_default_build_arguments)
            .verbosity(repository.verbosity)
            .io_redirects(io_redirects)
            .versions_maven_plugin_version(repository.maven.versions_maven_plugin_version.clone())
            .build()
    }
}

impl fmt::Debug for BuildCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildCoordinator")
            .field("configuration", &self.configuration)
            .field("configuration_location", &self.configuration_location)
            .field("local_store", &self.store.root_directory())
            .finish_non_exhaustive()
    }
}

fn describe(error: &SrcdepsError) -> String {
    match error {
        SrcdepsError::BuildFailed {
            reason,
            ..
        } => format!("{error}: {reason}"),
        _ => error.to_string(),
    }
}
