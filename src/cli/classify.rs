//! `srcdeps classify`: show how version strings are interpreted.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::version::{SRC_MARKER, SourceVersion, is_source_version};

/// Show whether versions are source versions, and their parts.
#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Version strings, e.g. 1.2.3-SRC-branch-main
    #[arg(value_name = "VERSION", required = true)]
    pub versions: Vec<String>,
}

impl ClassifyArgs {
    /// Print one line per version.
    pub fn execute(self) -> Result<()> {
        for version in &self.versions {
            println!("{}", describe(version));
        }
        Ok(())
    }
}

/// One-line description of `version`.
#[must_use]
pub fn describe(version: &str) -> String {
    if is_source_version(version) {
        match SourceVersion::parse(version) {
            Ok(parsed) => format!(
                "{}: {} (base {}, {} {})",
                version,
                "source version".green(),
                parsed.base(),
                parsed.kind(),
                parsed.scm_ref()
            ),
            Err(e) => format!("{}: {}", version, e.to_string().red()),
        }
    } else if version.contains(SRC_MARKER) {
        format!("{}: {}", version, "not a source version (malformed -SRC- suffix)".yellow())
    } else {
        format!("{}: {}", version, "not a source version".dimmed())
    }
}
