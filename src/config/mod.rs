//! Configuration for srcdeps.
//!
//! The configuration lives in a `srcdeps.yaml` file:
//!
//! ```yaml
//! configModelVersion: 2.2
//! skip: false
//! forwardProperties: [ "srcdeps.mvn.settings" ]
//! buildTimeout: 30m
//! verbosity: warn
//! builderIo:
//!   stdout: "append:/tmp/srcdeps-build.log"
//!   stderr: err2out
//! repositories:
//!   org.example:
//!     selectors: [ "org.example" ]
//!     urls: [ "git:https://github.com/example/example.git" ]
//!     buildArguments: [ "-Dcheckstyle.skip" ]
//! ```
//!
//! Top-level `verbosity`, `buildTimeout`, `skipTests`, `addDefaultBuildArguments`,
//! `builderIo` and `maven` act as defaults for every repository that does not set
//! them itself. Repositories are matched in file order.
//!
//! The build coordinator only reads [`Configuration::skip`] and
//! [`Configuration::forward_properties`]; repository lookup goes through a
//! [`RepositoryFinder`].

mod finder;
mod parser;
mod repository;
mod service;

pub use finder::{RepositoryFinder, ScmRepositoryFinder, Selector};
pub use parser::{parse_config, parse_duration};
pub use repository::{BuilderIo, MavenSettings, ScmRepository, Verbosity, id_as_path};
pub use service::ConfigurationService;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::constants::DEFAULT_BUILD_TIMEOUT;
use crate::core::SrcdepsError;

/// Read-only srcdeps configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    /// When set, no source builds happen at all
    pub skip: bool,
    /// Names of properties forwarded from the outer environment into every build
    pub forward_properties: Vec<String>,
    /// Configured repositories, in declaration order
    pub repositories: Vec<ScmRepository>,
}

impl Configuration {
    /// Parse a configuration from YAML text read from `origin`.
    pub fn from_yaml_str(content: &str, origin: &Path) -> Result<Self, SrcdepsError> {
        let file: ConfigurationFile = parse_config(content, origin)?;
        Ok(file.into_configuration())
    }

    /// Whether any repository is configured.
    #[must_use]
    pub fn has_repositories(&self) -> bool {
        !self.repositories.is_empty()
    }
}

/// On-disk shape of `srcdeps.yaml`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigurationFile {
    #[serde(default)]
    skip: bool,
    #[serde(default)]
    forward_properties: Vec<String>,
    #[serde(flatten)]
    defaults: RepositoryDefaults,
    #[serde(default, deserialize_with = "repositories_in_order")]
    repositories: Vec<(String, RepositoryFile)>,
}

/// Settings that may appear both at the top level and per repository.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryDefaults {
    #[serde(default, deserialize_with = "parser::deserialize_optional_duration")]
    build_timeout: Option<Duration>,
    #[serde(default)]
    skip_tests: Option<bool>,
    #[serde(default)]
    add_default_build_arguments: Option<bool>,
    #[serde(default)]
    verbosity: Option<Verbosity>,
    #[serde(default)]
    builder_io: Option<BuilderIo>,
    #[serde(default)]
    maven: Option<MavenSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryFile {
    #[serde(default)]
    selectors: Vec<String>,
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default)]
    build_arguments: Vec<String>,
    #[serde(flatten)]
    overrides: RepositoryDefaults,
}

impl ConfigurationFile {
    fn into_configuration(self) -> Configuration {
        let defaults = self.defaults;
        let repositories = self
            .repositories
            .into_iter()
            .map(|(id, repo)| {
                let own = repo.overrides;
                ScmRepository {
                    id,
                    selectors: repo.selectors,
                    urls: repo.urls,
                    build_arguments: repo.build_arguments,
                    build_timeout: own
                        .build_timeout
                        .or(defaults.build_timeout)
                        .unwrap_or(DEFAULT_BUILD_TIMEOUT),
                    skip_tests: own.skip_tests.or(defaults.skip_tests).unwrap_or(true),
                    add_default_build_arguments: own
                        .add_default_build_arguments
                        .or(defaults.add_default_build_arguments)
                        .unwrap_or(true),
                    verbosity: own.verbosity.or(defaults.verbosity).unwrap_or_default(),
                    builder_io: own
                        .builder_io
                        .or_else(|| defaults.builder_io.clone())
                        .unwrap_or_default(),
                    maven: own.maven.or_else(|| defaults.maven.clone()).unwrap_or_default(),
                }
            })
            .collect();

        Configuration {
            skip: self.skip,
            forward_properties: self.forward_properties,
            repositories,
        }
    }
}

/// Deserialize the `repositories` mapping while keeping declaration order.
fn repositories_in_order<'de, D>(deserializer: D) -> Result<Vec<(String, RepositoryFile)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedRepositories;

    impl<'de> Visitor<'de> for OrderedRepositories {
        type Value = Vec<(String, RepositoryFile)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping from repository id to repository settings")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut repositories = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((id, repo)) = map.next_entry::<String, RepositoryFile>()? {
                repositories.push((id, repo));
            }
            Ok(repositories)
        }
    }

    deserializer.deserialize_any(OrderedRepositories)
}
