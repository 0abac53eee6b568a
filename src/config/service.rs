//! Loading the configuration and the repository finder built from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Configuration, ScmRepositoryFinder};
use crate::constants::{CONFIG_FILE_NAME, ENV_CONFIG_PATH, ENV_FORWARD_PROPERTIES, ENV_SKIP};
use crate::core::{FileOperation, FileResultExt, SrcdepsError};

/// The loaded configuration together with where it came from.
///
/// A missing file is not an error: srcdeps logs a warning and continues with
/// an empty configuration, which means no repository can be found and every
/// source dependency fails to resolve. An unreadable or unparsable file is
/// reported as [`SrcdepsError::ConfigurationUnavailable`].
#[derive(Debug, Clone)]
pub struct ConfigurationService {
    configuration: Arc<Configuration>,
    repository_finder: Arc<ScmRepositoryFinder>,
    location: PathBuf,
}

impl ConfigurationService {
    /// The configuration path: `SRCDEPS_YAML_PATH` if set, otherwise
    /// `srcdeps.yaml` in the current directory.
    #[must_use]
    pub fn locate() -> PathBuf {
        std::env::var_os(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Load the configuration from `path` and apply environment overrides.
    pub async fn load(path: &Path) -> Result<Self, SrcdepsError> {
        let configuration = if tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::debug!(target: "srcdeps", "Using configuration {}", path.display());
            let content = tokio::fs::read_to_string(path)
                .await
                .with_file_context(
                    FileOperation::Read,
                    path,
                    "loading srcdeps configuration",
                    "config::ConfigurationService::load",
                )
                .map_err(|e| SrcdepsError::ConfigurationUnavailable {
                    path: path.display().to_string(),
                    reason: e.source.to_string(),
                })?;
            Configuration::from_yaml_str(&content, path)?
        } else {
            tracing::warn!(
                target: "srcdeps",
                "Could not locate srcdeps configuration at {}, defaulting to an empty configuration",
                path.display()
            );
            Configuration::default()
        };

        Self::from_configuration(apply_env_overrides(configuration)?, path.to_path_buf())
    }

    /// Wrap an already built configuration.
    pub fn from_configuration(
        configuration: Configuration,
        location: PathBuf,
    ) -> Result<Self, SrcdepsError> {
        let repository_finder = ScmRepositoryFinder::new(&configuration)?;
        Ok(Self {
            configuration: Arc::new(configuration),
            repository_finder: Arc::new(repository_finder),
            location,
        })
    }

    /// The configuration.
    #[must_use]
    pub fn configuration(&self) -> Arc<Configuration> {
        Arc::clone(&self.configuration)
    }

    /// Repository finder backed by this configuration.
    #[must_use]
    pub fn repository_finder(&self) -> Arc<ScmRepositoryFinder> {
        Arc::clone(&self.repository_finder)
    }

    /// Where the configuration was (or would have been) read from.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }
}

fn apply_env_overrides(mut configuration: Configuration) -> Result<Configuration, SrcdepsError> {
    if let Ok(value) = std::env::var(ENV_SKIP) {
        configuration.skip = match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" | "" => false,
            other => {
                return Err(SrcdepsError::ConfigurationUnavailable {
                    path: ENV_SKIP.to_string(),
                    reason: format!("expected true or false, got '{other}'"),
                });
            }
        };
        tracing::debug!(target: "srcdeps", "{} overrides skip = {}", ENV_SKIP, configuration.skip);
    }

    if let Ok(value) = std::env::var(ENV_FORWARD_PROPERTIES) {
        configuration.forward_properties = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    Ok(configuration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryFinder;
    use serial_test::serial;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
forwardProperties: [ "a.b" ]
repositories:
  org.example:
    selectors: [ "org.example" ]
    urls: [ "git:https://example.com/example.git" ]
"#;

    fn clear_env() {
        // SAFETY: tests touching the environment are serialized.
        unsafe {
            std::env::remove_var(ENV_SKIP);
            std::env::remove_var(ENV_FORWARD_PROPERTIES);
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_load_existing_file() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("srcdeps.yaml");
        std::fs::write(&path, CONFIG).unwrap();

        let service = ConfigurationService::load(&path).await.unwrap();
        assert_eq!(service.location(), path.as_path());
        assert!(!service.configuration().skip);
        assert_eq!(service.configuration().forward_properties, vec!["a.b"]);
        let repo = service
            .repository_finder()
            .find_repository("org.example", "foo", "1-SRC-tag-v1")
            .unwrap();
        assert_eq!(repo.id, "org.example");
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_file_defaults_to_empty() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.yaml");

        let service = ConfigurationService::load(&path).await.unwrap();
        assert_eq!(*service.configuration(), Configuration::default());
    }

    #[tokio::test]
    #[serial]
    async fn test_unparsable_file_is_fatal() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("srcdeps.yaml");
        std::fs::write(&path, "repositories: [ unclosed").unwrap();

        let err = ConfigurationService::load(&path).await.unwrap_err();
        assert!(matches!(err, SrcdepsError::ConfigurationUnavailable { .. }));
    }

    #[tokio::test]
    #[serial]
    async fn test_env_overrides() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("srcdeps.yaml");
        std::fs::write(&path, CONFIG).unwrap();

        // SAFETY: tests touching the environment are serialized.
        unsafe {
            std::env::set_var(ENV_SKIP, "true");
            std::env::set_var(ENV_FORWARD_PROPERTIES, "x.y, z");
        }
        let service = ConfigurationService::load(&path).await.unwrap();
        clear_env();

        assert!(service.configuration().skip);
        assert_eq!(service.configuration().forward_properties, vec!["x.y", "z"]);
    }

    #[tokio::test]
    #[serial]
    async fn test_invalid_skip_override() {
        clear_env();
        // SAFETY: tests touching the environment are serialized.
        unsafe {
            std::env::set_var(ENV_SKIP, "maybe");
        }
        let result = ConfigurationService::load(Path::new("/nonexistent/srcdeps.yaml")).await;
        clear_env();

        assert!(matches!(result, Err(SrcdepsError::ConfigurationUnavailable { .. })));
    }
}
