//! Everything a [`BuildService`](super::BuildService) needs to build one source version.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::build::io::IoRedirects;
use crate::config::Verbosity;
use crate::constants::DEFAULT_BUILD_TIMEOUT;
use crate::core::SrcdepsError;
use crate::version::SourceVersion;

/// An immutable request to check out and build one source version.
///
/// Created through [`BuildRequest::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    project_root_directory: PathBuf,
    scm_urls: Vec<String>,
    src_version: SourceVersion,
    build_arguments: Vec<String>,
    timeout: Duration,
    skip_tests: bool,
    forward_properties: Vec<String>,
    add_default_build_arguments: bool,
    verbosity: Verbosity,
    io_redirects: IoRedirects,
    versions_maven_plugin_version: Option<String>,
}

impl BuildRequest {
    /// Start building a request.
    #[must_use]
    pub fn builder() -> BuildRequestBuilder {
        BuildRequestBuilder::default()
    }

    /// Workspace directory the sources are checked out into.
    #[must_use]
    pub fn project_root_directory(&self) -> &Path {
        &self.project_root_directory
    }

    /// SCM URLs, tried in order.
    #[must_use]
    pub fn scm_urls(&self) -> &[String] {
        &self.scm_urls
    }

    /// The version to check out and build.
    #[must_use]
    pub const fn src_version(&self) -> &SourceVersion {
        &self.src_version
    }

    /// Arguments appended to the build tool invocation.
    #[must_use]
    pub fn build_arguments(&self) -> &[String] {
        &self.build_arguments
    }

    /// Upper bound for checkout plus build.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the project's tests are skipped.
    #[must_use]
    pub const fn skip_tests(&self) -> bool {
        self.skip_tests
    }

    /// Names of properties passed through to the nested build.
    #[must_use]
    pub fn forward_properties(&self) -> &[String] {
        &self.forward_properties
    }

    /// Whether the tool's default arguments are prepended.
    #[must_use]
    pub const fn add_default_build_arguments(&self) -> bool {
        self.add_default_build_arguments
    }

    /// Log level for the nested build.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Standard stream redirects.
    #[must_use]
    pub const fn io_redirects(&self) -> &IoRedirects {
        &self.io_redirects
    }

    /// Pinned `versions-maven-plugin` version, if any.
    #[must_use]
    pub fn versions_maven_plugin_version(&self) -> Option<&str> {
        self.versions_maven_plugin_version.as_deref()
    }
}

/// Builder for [`BuildRequest`].
///
/// The project root directory, at least one SCM URL and the source version are
/// mandatory; everything else has a default.
#[derive(Debug, Clone)]
pub struct BuildRequestBuilder {
    project_root_directory: Option<PathBuf>,
    scm_urls: Vec<String>,
    src_version: Option<SourceVersion>,
    build_arguments: Vec<String>,
    timeout: Duration,
    skip_tests: bool,
    forward_properties: Vec<String>,
    add_default_build_arguments: bool,
    verbosity: Verbosity,
    io_redirects: IoRedirects,
    versions_maven_plugin_version: Option<String>,
}

impl Default for BuildRequestBuilder {
    fn default() -> Self {
        Self {
            project_root_directory: None,
            scm_urls: Vec::new(),
            src_version: None,
            build_arguments: Vec::new(),
            timeout: DEFAULT_BUILD_TIMEOUT,
            skip_tests: true,
            forward_properties: Vec::new(),
            add_default_build_arguments: true,
            verbosity: Verbosity::default(),
            io_redirects: IoRedirects::inherit_all(),
            versions_maven_plugin_version: None,
        }
    }
}

impl BuildRequestBuilder {
    pub fn project_root_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_root_directory = Some(dir.into());
        self
    }

    pub fn scm_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scm_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn src_version(mut self, version: SourceVersion) -> Self {
        self.src_version = Some(version);
        self
    }

    pub fn build_arguments<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_arguments = args.into_iter().map(Into::into).collect();
        self
    }

    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn skip_tests(mut self, skip: bool) -> Self {
        self.skip_tests = skip;
        self
    }

    pub fn forward_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forward_properties = names.into_iter().map(Into::into).collect();
        self
    }

    pub const fn add_default_build_arguments(mut self, add: bool) -> Self {
        self.add_default_build_arguments = add;
        self
    }

    pub const fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn io_redirects(mut self, redirects: IoRedirects) -> Self {
        self.io_redirects = redirects;
        self
    }

    pub fn versions_maven_plugin_version(mut self, version: Option<String>) -> Self {
        self.versions_maven_plugin_version = version;
        self
    }

    /// Finish the request.
    pub fn build(self) -> Result<BuildRequest, SrcdepsError> {
        let missing = |what: &str| SrcdepsError::InvalidBuildRequest {
            reason: format!("{what} is required"),
        };

        let project_root_directory =
            self.project_root_directory.ok_or_else(|| missing("project root directory"))?;
        if self.scm_urls.is_empty() {
            return Err(missing("at least one SCM URL"));
        }
        let src_version = self.src_version.ok_or_else(|| missing("source version"))?;

        Ok(BuildRequest {
            project_root_directory,
            scm_urls: self.scm_urls,
            src_version,
            build_arguments: self.build_arguments,
            timeout: self.timeout,
            skip_tests: self.skip_tests,
            forward_properties: self.forward_properties,
            add_default_build_arguments: self.add_default_build_arguments,
            verbosity: self.verbosity,
            io_redirects: self.io_redirects,
            versions_maven_plugin_version: self.versions_maven_plugin_version,
        })
    }
}
