//! Mapping dependency coordinates to configured SCM repositories.

use glob::Pattern;

use crate::config::{Configuration, ScmRepository};
use crate::core::SrcdepsError;

/// Resolves a coordinate to the repository that knows how to build it.
pub trait RepositoryFinder: Send + Sync {
    /// Find the repository for `group:artifact:version`.
    ///
    /// # Errors
    ///
    /// [`SrcdepsError::RepositoryNotFound`] when nothing matches.
    fn find_repository(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> Result<ScmRepository, SrcdepsError>;
}

/// A `group[:artifact[:version]]` pattern; every part is a glob.
///
/// Omitted parts match anything, so `org.example` selects every artifact of
/// the group and `org.example:foo` every version of `foo`.
#[derive(Debug, Clone)]
pub struct Selector {
    group: Pattern,
    artifact: Option<Pattern>,
    version: Option<Pattern>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(selector: &str) -> Result<Self, SrcdepsError> {
        let compile = |part: &str| {
            Pattern::new(part).map_err(|e| SrcdepsError::ConfigurationUnavailable {
                path: "srcdeps.yaml".to_string(),
                reason: format!("invalid selector '{selector}': {e}"),
            })
        };

        let mut parts = selector.trim().splitn(3, ':');
        let group = parts.next().unwrap_or_default();
        if group.is_empty() {
            return Err(SrcdepsError::ConfigurationUnavailable {
                path: "srcdeps.yaml".to_string(),
                reason: format!("invalid selector '{selector}': group must not be empty"),
            });
        }

        Ok(Self {
            group: compile(group)?,
            artifact: parts.next().map(compile).transpose()?,
            version: parts.next().map(compile).transpose()?,
        })
    }

    /// Whether this selector matches the coordinate.
    #[must_use]
    pub fn matches(&self, group: &str, artifact: &str, version: &str) -> bool {
        self.group.matches(group)
            && self.artifact.as_ref().is_none_or(|p| p.matches(artifact))
            && self.version.as_ref().is_none_or(|p| p.matches(version))
    }
}

/// Finds repositories by matching their selectors, first match in declaration order wins.
#[derive(Debug, Clone, Default)]
pub struct ScmRepositoryFinder {
    repositories: Vec<(Vec<Selector>, ScmRepository)>,
}

impl ScmRepositoryFinder {
    /// Compile the selectors of every configured repository.
    pub fn new(configuration: &Configuration) -> Result<Self, SrcdepsError> {
        let repositories = configuration
            .repositories
            .iter()
            .map(|repo| {
                let selectors = repo
                    .selectors
                    .iter()
                    .map(|s| Selector::parse(s))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((selectors, repo.clone()))
            })
            .collect::<Result<Vec<_>, SrcdepsError>>()?;

        Ok(Self {
            repositories,
        })
    }
}

impl RepositoryFinder for ScmRepositoryFinder {
    fn find_repository(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> Result<ScmRepository, SrcdepsError> {
        self.repositories
            .iter()
            .find(|(selectors, _)| selectors.iter().any(|s| s.matches(group, artifact, version)))
            .map(|(_, repo)| {
                tracing::debug!(
                    target: "srcdeps",
                    "{}:{}:{} maps to repository '{}'",
                    group,
                    artifact,
                    version,
                    repo.id
                );
                repo.clone()
            })
            .ok_or_else(|| SrcdepsError::RepositoryNotFound {
                group: group.to_string(),
                artifact: artifact.to_string(),
                version: version.to_string(),
            })
    }
}
