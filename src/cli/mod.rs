//! Command-line interface for srcdeps.
//!
//! ```bash
//! # Build source dependencies that are missing from ~/.m2/repository
//! srcdeps build org.example:foo:1.2.3-SRC-branch-main org.example:bar:2.0-SRC-tag-v2.0
//!
//! # Use a specific configuration and local repository
//! srcdeps build --config ci/srcdeps.yaml --local-repo /tmp/m2 org.example:foo:1.2.3-SRC-revision-3f2a9c1
//!
//! # Check how versions are classified
//! srcdeps classify 1.2.3 1.2.3-SRC-branch-main
//! ```
//!
//! Global flags:
//! - `--verbose` - debug logging
//! - `--quiet` - errors only
//!
//! `RUST_LOG` takes precedence over both.

mod build;
mod classify;

pub use build::BuildArgs;
pub use classify::ClassifyArgs;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(
    name = "srcdeps",
    about = "Build source dependencies on demand",
    version,
    long_about = "srcdeps builds dependencies whose version names a branch, tag or revision \
                  (e.g. 1.2.3-SRC-branch-main) from source and installs them into the local repository."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build source dependencies that are not in the local repository yet
    Build(BuildArgs),

    /// Show whether versions are source versions
    Classify(ClassifyArgs),
}

impl Cli {
    /// Initialise logging and run the selected command.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_filter());

        match self.command {
            Commands::Build(args) => args.execute().await,
            Commands::Classify(args) => args.execute(),
        }
    }

    /// Default log filter for the chosen verbosity.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "srcdeps=debug,build=debug"
        } else if self.quiet {
            "error"
        } else {
            "srcdeps=info,build=info,warn"
        }
    }
}

/// Log to stderr, honouring `RUST_LOG` over `default_filter`.
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from([
            "srcdeps",
            "build",
            "--config",
            "ci/srcdeps.yaml",
            "--max-parallel",
            "2",
            "org.example:foo:1.0-SRC-branch-main",
        ]);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.coordinates, ["org.example:foo:1.0-SRC-branch-main"]);
                assert_eq!(args.config.as_deref(), Some(std::path::Path::new("ci/srcdeps.yaml")));
                assert_eq!(args.max_parallel, Some(2));
            }
            Commands::Classify(_) => panic!("expected build"),
        }
    }

    #[test]
    fn test_build_args_and_build_command_are_distinct() {
        use crate::build::command::BuildCommand;

        let Commands::Build(args) = Cli::parse_from(["srcdeps", "build", "org.example:foo:1.0"]).command else {
            panic!("expected build");
        };
        let args: BuildArgs = args;
        let command = BuildCommand::new("mvn").args(args.coordinates.iter().cloned());
        assert_eq!(command.arguments(), ["org.example:foo:1.0"]);
        assert!(std::any::type_name::<BuildArgs>().ends_with("cli::build::BuildArgs"));
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(Cli::parse_from(["srcdeps", "-v", "classify", "1.0"]).log_filter(), "srcdeps=debug,build=debug");
        assert_eq!(Cli::parse_from(["srcdeps", "--quiet", "classify", "1.0"]).log_filter(), "error");
        assert!(Cli::try_parse_from(["srcdeps", "-v", "-q", "classify", "1.0"]).is_err());
    }

    #[test]
    fn test_build_requires_coordinates() {
        assert!(Cli::try_parse_from(["srcdeps", "build"]).is_err());
    }
}
