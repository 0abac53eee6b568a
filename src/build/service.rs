//! Source builds with Git and Maven.
//!
//! A build runs in three steps inside the locked workspace:
//!
//! 1. **Checkout**: clone the first reachable URL (or fetch if the workspace
//!    already holds a clone) and detach at the requested branch, tag or revision
//! 2. **Stamp**: rewrite the project version to the source version with
//!    `versions-maven-plugin`, so the installed artifacts carry that version
//! 3. **Build**: run `mvn` with the default and requested arguments
//!
//! The whole sequence is bounded by [`BuildRequest::timeout`].

use async_trait::async_trait;
use std::path::Path;

use crate::build::BuildService;
use crate::build::command::BuildCommand;
use crate::build::request::BuildRequest;
use crate::config::Verbosity;
use crate::constants::{DEFAULT_VERSIONS_MAVEN_PLUGIN_VERSION, GIT_URL_PREFIX};
use crate::core::{FileOperation, FileResultExt, SrcdepsError};
use crate::utils::platform::{command_exists, get_git_command, get_maven_command};
use crate::version::{ScmRefKind, SourceVersion};

/// [`BuildService`] that checks out with `git` and builds with `mvn`.
#[derive(Debug, Clone)]
pub struct ScmBuildService {
    git: String,
    maven: String,
}

impl Default for ScmBuildService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScmBuildService {
    /// Use `git` and `mvn` from the `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tools(get_git_command(), get_maven_command())
    }

    /// Use specific executables.
    pub fn with_tools(git: impl Into<String>, maven: impl Into<String>) -> Self {
        Self {
            git: git.into(),
            maven: maven.into(),
        }
    }

    fn ensure_tools(&self) -> Result<(), SrcdepsError> {
        for tool in [&self.git, &self.maven] {
            if !command_exists(tool) {
                return Err(SrcdepsError::ToolNotFound {
                    tool: tool.clone(),
                });
            }
        }
        Ok(())
    }

    async fn run(&self, request: &BuildRequest) -> Result<(), SrcdepsError> {
        let workspace = request.project_root_directory();
        let version = request.src_version();

        tracing::info!(
            target: "srcdeps",
            "Building {} from {} in {}",
            version,
            request.scm_urls().join(", "),
            workspace.display()
        );

        self.checkout(request).await?;

        let plugin = request.versions_maven_plugin_version().unwrap_or(DEFAULT_VERSIONS_MAVEN_PLUGIN_VERSION);
        BuildCommand::new(&self.maven)
            .current_dir(workspace)
            .args(version_set_arguments(request, plugin))
            .with_context(version.as_str())
            .execute_success()
            .await?;

        let (stdin, stdout, stderr) = request.io_redirects().open().with_file_context(
            FileOperation::Write,
            workspace,
            "opening build output redirects",
            "build::service::run",
        )?;
        BuildCommand::new(&self.maven)
            .current_dir(workspace)
            .args(maven_arguments(request, std::env::vars()))
            .with_context(version.as_str())
            .stdio(stdin, stdout, stderr)
            .execute_success()
            .await?;

        tracing::info!(target: "srcdeps", "Built {}", version);
        Ok(())
    }

    async fn checkout(&self, request: &BuildRequest) -> Result<(), SrcdepsError> {
        let mut last_error = None;
        for url in request.scm_urls() {
            match self.checkout_url(url, request.project_root_directory(), request.src_version()).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(target: "srcdeps", "Checkout from {} failed: {}", url, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| SrcdepsError::InvalidBuildRequest {
            reason: "at least one SCM URL is required".to_string(),
        }))
    }

    async fn checkout_url(&self, url: &str, workspace: &Path, version: &SourceVersion) -> Result<(), SrcdepsError> {
        let git_url = url.strip_prefix(GIT_URL_PREFIX).ok_or_else(|| SrcdepsError::BuildFailed {
            operation: "checkout".to_string(),
            reason: format!("unsupported SCM URL '{url}': only {GIT_URL_PREFIX} URLs are supported"),
        })?;
        let context = version.as_str();

        if workspace.join(".git").is_dir() {
            BuildCommand::git()
                .with_program(&self.git)
                .args(["remote", "set-url", "origin", git_url])
                .current_dir(workspace)
                .with_context(context)
                .execute_success()
                .await?;
            BuildCommand::git_fetch()
                .with_program(&self.git)
                .current_dir(workspace)
                .with_context(context)
                .execute_success()
                .await?;
        } else {
            clear_directory(workspace).await?;
            BuildCommand::git_clone(git_url, workspace)
                .with_program(&self.git)
                .with_context(context)
                .execute_success()
                .await?;
        }

        BuildCommand::git_checkout(&checkout_reference(version))
            .with_program(&self.git)
            .current_dir(workspace)
            .with_context(context)
            .execute_success()
            .await
    }
}

#[async_trait]
impl BuildService for ScmBuildService {
    async fn build(&self, request: &BuildRequest) -> Result<(), SrcdepsError> {
        self.ensure_tools()?;
        let limit = request.timeout();
        match tokio::time::timeout(limit, self.run(request)).await {
            Ok(result) => result,
            Err(_) => Err(SrcdepsError::BuildTimeout {
                operation: format!("source build of {}", request.src_version()),
                seconds: limit.as_secs(),
            }),
        }
    }
}

/// Remove leftovers of an interrupted clone so `git clone` gets an empty directory.
async fn clear_directory(dir: &Path) -> Result<(), SrcdepsError> {
    if dir.exists() {
        tokio::fs::remove_dir_all(dir).await.with_file_context(
            FileOperation::Write,
            dir,
            "clearing build directory",
            "build::service::clear_directory",
        )?;
    }
    tokio::fs::create_dir_all(dir).await.with_file_context(
        FileOperation::CreateDir,
        dir,
        "creating build directory",
        "build::service::clear_directory",
    )?;
    Ok(())
}

/// The Git reference to detach at for `version`.
#[must_use]
pub fn checkout_reference(version: &SourceVersion) -> String {
    match version.kind() {
        ScmRefKind::Branch => format!("origin/{}", version.scm_ref()),
        ScmRefKind::Tag => format!("refs/tags/{}", version.scm_ref()),
        ScmRefKind::Revision => version.scm_ref().to_string(),
    }
}

/// Maven options whose value may follow as a separate argument.
const MAVEN_VALUE_OPTIONS: &[&str] = &[
    "-D",
    "--define",
    "-P",
    "--activate-profiles",
    "-s",
    "--settings",
    "-gs",
    "--global-settings",
    "-t",
    "--toolchains",
    "-f",
    "--file",
    "-pl",
    "--projects",
    "-T",
    "--threads",
    "-l",
    "--log-file",
    "-rf",
    "--resume-from",
    "-b",
    "--builder",
];

/// Arguments for `mvn` to stamp the source version into the project.
///
/// Request options are passed along together with their values (`-s settings.xml`
/// stays a pair); goals and phases are left to the main build.
#[must_use]
pub fn version_set_arguments(request: &BuildRequest, plugin_version: &str) -> Vec<String> {
    let mut args = vec![
        "-B".to_string(),
        format!("org.codehaus.mojo:versions-maven-plugin:{plugin_version}:set"),
        format!("-DnewVersion={}", request.src_version()),
        "-DgenerateBackupPoms=false".to_string(),
    ];
    let mut takes_value = false;
    for arg in request.build_arguments() {
        if takes_value {
            args.push(arg.clone());
            takes_value = false;
        } else if arg.starts_with('-') {
            takes_value = MAVEN_VALUE_OPTIONS.contains(&arg.as_str());
            args.push(arg.clone());
        }
    }
    args
}

/// Arguments for the main `mvn` invocation.
///
/// `env` supplies the values of forwarded properties.
pub fn maven_arguments<I>(request: &BuildRequest, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut args = Vec::new();
    if request.add_default_build_arguments() {
        args.extend(["clean".to_string(), "install".to_string()]);
    }
    if request.skip_tests() {
        args.push("-DskipTests".to_string());
    }
    args.push("-B".to_string());
    match request.verbosity() {
        Verbosity::Trace | Verbosity::Debug => args.push("-X".to_string()),
        Verbosity::Error => args.push("-q".to_string()),
        Verbosity::Info | Verbosity::Warn => {}
    }
    args.extend(forwarded_properties(request.forward_properties(), env));
    args.extend(request.build_arguments().iter().cloned());
    args
}

/// `-Dname=value` for every variable in `env` selected by `names`.
///
/// A name ending in `*` selects every variable with that prefix. The result is
/// sorted so the command line is stable.
pub fn forwarded_properties<I>(names: &[String], env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    if names.is_empty() {
        return Vec::new();
    }
    let selected = |key: &str| {
        names.iter().any(|name| match name.strip_suffix('*') {
            Some(prefix) => key.starts_with(prefix),
            None => key == name,
        })
    };
    let mut props: Vec<String> = env
        .into_iter()
        .filter(|(key, _)| selected(key))
        .map(|(key, value)| format!("-D{key}={value}"))
        .collect();
    props.sort();
    props
}
