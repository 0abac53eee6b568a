//! Fluent builder for the external commands a source build runs.
//!
//! Every `git` and `mvn` invocation goes through [`BuildCommand`] so that
//! timeouts, logging and failure reporting look the same for all of them.
//!
//! ```rust,ignore
//! use srcdeps::build::command::BuildCommand;
//!
//! # async fn example() -> Result<(), srcdeps::core::SrcdepsError> {
//! BuildCommand::git()
//!     .args(["fetch", "--tags", "--force", "origin"])
//!     .current_dir("/builds/org/example/branch-main")
//!     .with_context("org.example:foo:1.0-SRC-branch-main")
//!     .execute_success()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::SrcdepsError;
use crate::utils::platform::get_git_command;

/// Builder for one external command.
///
/// By default output is captured and the command runs without a timeout. Source
/// builds bound the whole checkout and build sequence instead of single commands.
#[derive(Debug)]
pub struct BuildCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout_duration: Option<Duration>,
    context: Option<String>,
    stdio: Option<(Stdio, Stdio, Stdio)>,
}

impl BuildCommand {
    /// A command running `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout_duration: None,
            context: None,
            stdio: None,
        }
    }

    /// A `git` command.
    pub fn git() -> Self {
        Self::new(get_git_command())
    }

    /// Run a different executable with the same arguments.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Run in `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Kill the command if it runs longer than `duration` (`None` = no limit).
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Label used in log messages, typically the coordinate being built.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Use these handles instead of capturing output.
    pub fn stdio(mut self, stdin: Stdio, stdout: Stdio, stderr: Stdio) -> Self {
        self.stdio = Some((stdin, stdout, stderr));
        self
    }

    /// The program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments collected so far.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Short name of the operation for error messages, e.g. `git clone`.
    fn operation(&self) -> String {
        match self.args.iter().find(|arg| !arg.starts_with('-')) {
            Some(first) => format!("{} {}", self.program, first),
            None => self.program.clone(),
        }
    }

    /// Run the command and return its output.
    ///
    /// Output is empty when [`stdio`](Self::stdio) redirected it.
    pub async fn execute(self) -> Result<BuildCommandOutput, SrcdepsError> {
        let start = Instant::now();
        let operation = self.operation();
        let command_line = format!("{} {}", self.program, self.args.join(" "));
        let ctx = self.context.as_deref().unwrap_or("-");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        match self.stdio {
            Some((stdin, stdout, stderr)) => {
                cmd.stdin(stdin).stdout(stdout).stderr(stderr);
            }
            None => {
                cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        tracing::debug!(target: "build", "({}) Executing command: {}", ctx, command_line);

        // Spawn rather than `output()`, which would replace redirected handles with pipes.
        let output_future = async move { cmd.spawn()?.wait_with_output().await };
        let result = match self.timeout_duration {
            Some(duration) => match timeout(duration, output_future).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        target: "build",
                        "({}) Command timed out after {} seconds: {}",
                        ctx,
                        duration.as_secs(),
                        command_line
                    );
                    return Err(SrcdepsError::BuildTimeout {
                        operation,
                        seconds: duration.as_secs(),
                    });
                }
            },
            None => output_future.await,
        };

        let output = result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SrcdepsError::ToolNotFound {
                    tool: self.program.clone(),
                }
            } else {
                SrcdepsError::BuildFailed {
                    operation: operation.clone(),
                    reason: format!("failed to start {command_line}: {e}"),
                }
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            tracing::debug!(
                target: "build",
                "({}) Command failed with exit code: {:?}",
                ctx,
                output.status.code()
            );
            let reason = if !stderr.trim().is_empty() {
                stderr.trim().to_string()
            } else if !stdout.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                match output.status.code() {
                    Some(code) => format!("{command_line} exited with code {code}"),
                    None => format!("{command_line} was terminated by a signal"),
                }
            };
            return Err(SrcdepsError::BuildFailed {
                operation,
                reason,
            });
        }

        if !stdout.trim().is_empty() {
            tracing::trace!(target: "build", "({}) {}", ctx, stdout.trim());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(
                target: "build::perf",
                "({}) {} took {:.2}s",
                ctx,
                operation,
                elapsed.as_secs_f64()
            );
        }

        Ok(BuildCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Run the command, discarding its output.
    pub async fn execute_success(self) -> Result<(), SrcdepsError> {
        self.execute().await.map(|_| ())
    }
}

/// Captured output of a [`BuildCommand`].
#[derive(Debug, Clone, Default)]
pub struct BuildCommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

// Git invocations used by the checkout step.
impl BuildCommand {
    /// `git clone --no-checkout <url> <target>`
    pub fn git_clone(url: &str, target: impl AsRef<Path>) -> Self {
        Self::git().args(["clone", "--no-checkout", url]).arg(target.as_ref().display().to_string())
    }

    /// `git fetch --tags --force origin`
    pub fn git_fetch() -> Self {
        Self::git().args(["fetch", "--tags", "--force", "origin"])
    }

    /// `git checkout --force --detach <reference>`
    pub fn git_checkout(reference: &str) -> Self {
        Self::git().args(["checkout", "--force", "--detach", reference])
    }
}
