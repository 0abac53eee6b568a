//! `srcdeps build`: resolve a list of coordinates, building source versions as needed.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::build::ScmBuildService;
use crate::config::ConfigurationService;
use crate::coordinator::{BuildCoordinator, BuildOutcome};
use crate::core::{DependencyCoordinate, SrcdepsError};
use crate::resolver::{ResolutionInterceptor, default_max_parallel};
use crate::store::{LocalStore, MavenLocalStore};
use crate::utils::platform::resolve_path;
use crate::workspace::LockingBuildDirectories;

/// Build source dependencies that are not in the local repository yet.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Dependencies as group:artifact:version
    #[arg(value_name = "COORDINATE", required = true)]
    pub coordinates: Vec<String>,

    /// Configuration file (default: $SRCDEPS_YAML_PATH or ./srcdeps.yaml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Local repository (default: $SRCDEPS_MAVEN_REPO_LOCAL or ~/.m2/repository)
    #[arg(long, value_name = "PATH")]
    pub local_repo: Option<String>,

    /// Root of the build workspaces (default: $SRCDEPS_BUILD_ROOT or ~/.srcdeps/build)
    #[arg(long, value_name = "PATH")]
    pub build_root: Option<String>,

    /// Maximum number of dependencies handled at once
    #[arg(long, value_name = "NUMBER")]
    pub max_parallel: Option<usize>,
}

impl BuildArgs {
    /// Run the command.
    ///
    /// Fails when any coordinate errored or is still unavailable afterwards.
    pub async fn execute(self) -> Result<()> {
        let coordinates = self
            .coordinates
            .iter()
            .map(|c| c.parse::<DependencyCoordinate>())
            .collect::<Result<Vec<_>, SrcdepsError>>()?;

        let config_path = self.config.clone().unwrap_or_else(ConfigurationService::locate);
        let configuration = ConfigurationService::load(&config_path).await?;
        if !configuration.configuration().has_repositories() {
            tracing::debug!("No repositories configured in {}", configuration.location().display());
        }

        let store = match &self.local_repo {
            Some(path) => MavenLocalStore::new(resolve_path(path)?),
            None => MavenLocalStore::user_default()?,
        };
        let directories = match &self.build_root {
            Some(path) => LockingBuildDirectories::new(resolve_path(path)?),
            None => LockingBuildDirectories::user_default()?,
        };
        tracing::debug!(
            "Local repository {}, build root {}",
            store.root_directory().display(),
            directories.root().display()
        );

        let coordinator = BuildCoordinator::from_configuration_service(
            &configuration,
            Arc::new(directories),
            Arc::new(ScmBuildService::new()),
            Arc::new(store),
        );
        let interceptor = ResolutionInterceptor::new(Arc::new(coordinator));

        let max_parallel = self.max_parallel.unwrap_or_else(default_max_parallel);
        let results = interceptor.intercept_all(coordinates, max_parallel).await;

        let mut unavailable = 0;
        for (coordinate, result) in &results {
            match result {
                Ok(None) => println!("{} {}", coordinate, "not a source version".dimmed()),
                Ok(Some(outcome)) => {
                    if !matches!(outcome, BuildOutcome::Skipped) && !outcome.is_available() {
                        unavailable += 1;
                    }
                    println!("{} {}", coordinate, format_outcome(outcome));
                }
                Err(e) => {
                    unavailable += 1;
                    println!("{} {}", coordinate, e.to_string().red());
                }
            }
        }

        if unavailable > 0 {
            anyhow::bail!(
                "Source build incomplete: {unavailable} of {} dependencies are not available",
                results.len()
            );
        }
        Ok(())
    }
}

fn format_outcome(outcome: &BuildOutcome) -> colored::ColoredString {
    let text = outcome.to_string();
    match outcome {
        BuildOutcome::Built | BuildOutcome::BuiltConcurrently => text.green(),
        BuildOutcome::AlreadyAvailable => text.normal(),
        BuildOutcome::Skipped => text.yellow(),
        BuildOutcome::Inconsistent | BuildOutcome::Failed { .. } => text.red(),
    }
}
