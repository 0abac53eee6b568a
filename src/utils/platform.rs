//! Platform-specific utilities and cross-platform compatibility helpers
//!
//! Home directory lookup, path expansion, and the names of the external tools
//! (`git`, `mvn`) that source builds shell out to.
//!
//! # Examples
//!
//! ```rust,no_run
//! use srcdeps::utils::platform::{get_home_dir, resolve_path};
//!
//! # fn example() -> anyhow::Result<()> {
//! let home = get_home_dir()?;
//! println!("Home directory: {}", home.display());
//!
//! let build_root = resolve_path("~/.srcdeps/build")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Returns the user's home directory.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Returns the Git executable name for the current platform.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() {
        "git.exe"
    } else {
        "git"
    }
}

/// Returns the Maven executable name for the current platform.
#[must_use]
pub const fn get_maven_command() -> &'static str {
    if is_windows() {
        "mvn.cmd"
    } else {
        "mvn"
    }
}

/// Whether `cmd` can be found on the `PATH`.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Expand a leading `~/` and environment variables (`$VAR`, `${VAR}`) in `path`.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = if let Some(stripped) = path.strip_prefix("~/") {
        get_home_dir()?.join(stripped)
    } else if path.starts_with('~') {
        return Err(anyhow::anyhow!(
            "Invalid path: {path}\n\n\
            Tilde expansion only supports '~/' for home directory."
        ));
    } else {
        PathBuf::from(path)
    };

    let path_str = expanded.to_string_lossy();
    let expanded_str = shellexpand::env(&path_str)
        .with_context(|| {
            format!(
                "Failed to expand environment variables in path: {path_str}\n\n\
                Check for undefined variables (e.g. $UNDEFINED_VAR) or invalid syntax"
            )
        })?
        .into_owned();

    Ok(PathBuf::from(expanded_str))
}

/// Default root for source build workspaces: `~/.srcdeps/build`.
pub fn default_build_root() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".srcdeps").join("build"))
}
