//! Hooking source builds into dependency resolution.
//!
//! A resolution engine calls [`ResolutionInterceptor::on_dependency`] for every
//! dependency it is about to resolve. Dependencies with an ordinary version pass
//! straight through; source versions are handed to the
//! [`BuildCoordinator`] and the call returns once the artifact is in the local
//! store (or the build has given up).
//!
//! [`ResolutionInterceptor::intercept_all`] plays the role of a parallel
//! resolution engine for the CLI: it runs many dependencies concurrently,
//! bounded by `max_parallel`.

use futures::stream::{self, StreamExt};
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::coordinator::{BuildCoordinator, BuildOutcome};
use crate::core::{DependencyCoordinate, SrcdepsError};
use crate::version::is_source_version;

/// Sends source dependencies to the build coordinator.
#[derive(Debug, Clone)]
pub struct ResolutionInterceptor {
    coordinator: Arc<BuildCoordinator>,
}

impl ResolutionInterceptor {
    /// Intercept on behalf of `coordinator`.
    pub const fn new(coordinator: Arc<BuildCoordinator>) -> Self {
        Self {
            coordinator,
        }
    }

    /// The coordinator builds are delegated to.
    #[must_use]
    pub fn coordinator(&self) -> &BuildCoordinator {
        &self.coordinator
    }

    /// Called before `coordinate` is resolved.
    ///
    /// Returns once any needed source build has completed. Errors from the
    /// coordinator are passed on unchanged.
    pub async fn on_dependency(&self, coordinate: &DependencyCoordinate) -> Result<(), SrcdepsError> {
        self.resolve(coordinate).await.map(|_| ())
    }

    /// Like [`on_dependency`](Self::on_dependency), also reporting what happened.
    ///
    /// `None` means the version is not a source version and nothing was done.
    pub async fn resolve(&self, coordinate: &DependencyCoordinate) -> Result<Option<BuildOutcome>, SrcdepsError> {
        if !is_source_version(coordinate.version()) {
            tracing::trace!(target: "srcdeps", "{} is not a source dependency", coordinate);
            return Ok(None);
        }

        tracing::debug!(target: "srcdeps", "Intercepted source dependency {}", coordinate);
        self.coordinator
            .build_if_necessary(coordinate.group(), coordinate.artifact(), coordinate.version())
            .await
            .map(Some)
    }

    /// Resolve all `coordinates`, at most `max_parallel` at a time.
    ///
    /// Results come back in the order of `coordinates`. A `max_parallel` of
    /// zero is treated as one.
    pub async fn intercept_all(
        &self,
        coordinates: Vec<DependencyCoordinate>,
        max_parallel: usize,
    ) -> Vec<(DependencyCoordinate, Result<Option<BuildOutcome>, SrcdepsError>)> {
        stream::iter(coordinates)
            .map(|coordinate| async move {
                let result = self.resolve(&coordinate).await;
                (coordinate, result)
            })
            .buffered(max_parallel.max(1))
            .collect()
            .await
    }
}

/// Default parallelism for [`ResolutionInterceptor::intercept_all`]: the number
/// of available CPUs.
#[must_use]
pub fn default_max_parallel() -> usize {
    std::thread::available_parallelism().map_or(4, NonZeroUsize::get)
}
