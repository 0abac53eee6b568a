//! SCM repository descriptors: where a group of artifacts lives and how to build it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_BUILD_TIMEOUT;

/// Log level requested from the nested build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Everything, including tool debug output
    Trace,
    /// Tool debug output
    Debug,
    /// Normal tool output
    Info,
    /// Warnings and errors only
    #[default]
    Warn,
    /// Errors only
    Error,
}

/// Redirect targets for the nested build's standard streams.
///
/// Values use the forms understood by
/// [`IoRedirects::parse_uri`](crate::build::IoRedirects::parse_uri); `None`
/// means inherit from the current process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderIo {
    /// Where stdin is read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    /// Where stdout goes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Where stderr goes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

/// Maven specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MavenSettings {
    /// Pin for the `versions-maven-plugin` used to rewrite project versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions_maven_plugin_version: Option<String>,
}

/// A source repository and the settings for building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScmRepository {
    /// Dotted identifier, e.g. `org.example.foo`
    pub id: String,
    /// `group[:artifact[:version]]` patterns this repository serves
    pub selectors: Vec<String>,
    /// SCM URLs, tried in order (e.g. `git:https://github.com/example/foo.git`)
    pub urls: Vec<String>,
    /// Extra arguments for the build tool
    pub build_arguments: Vec<String>,
    /// Upper bound for the whole build
    pub build_timeout: Duration,
    /// Skip the project's tests
    pub skip_tests: bool,
    /// Prepend the build tool's default arguments (`clean install`)
    pub add_default_build_arguments: bool,
    /// Log level for the nested build
    pub verbosity: Verbosity,
    /// Standard stream redirects
    pub builder_io: BuilderIo,
    /// Maven settings
    pub maven: MavenSettings,
}

impl ScmRepository {
    /// Create a repository with default build settings.
    pub fn new(id: impl Into<String>, selectors: Vec<String>, urls: Vec<String>) -> Self {
        Self {
            id: id.into(),
            selectors,
            urls,
            build_arguments: Vec::new(),
            build_timeout: DEFAULT_BUILD_TIMEOUT,
            skip_tests: true,
            add_default_build_arguments: true,
            verbosity: Verbosity::default(),
            builder_io: BuilderIo::default(),
            maven: MavenSettings::default(),
        }
    }

    /// The repository id as a relative path, one component per dot-separated segment.
    ///
    /// Used as the key of the repository's build workspaces.
    #[must_use]
    pub fn id_as_path(&self) -> PathBuf {
        id_as_path(&self.id)
    }
}

/// Convert a dotted identifier (`org.example`) into a relative path (`org/example`).
#[must_use]
pub fn id_as_path(id: &str) -> PathBuf {
    id.split('.').filter(|segment| !segment.is_empty()).collect()
}
