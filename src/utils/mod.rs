//! Utility modules shared across srcdeps.
//!
//! - [`platform`] - home directory, path expansion and external tool names

pub mod platform;

pub use platform::{command_exists, get_git_command, get_home_dir, get_maven_command, resolve_path};
