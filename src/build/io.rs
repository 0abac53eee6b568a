//! Standard stream redirects for nested builds.
//!
//! Redirect targets are written as short URIs:
//!
//! | Form | Meaning | Valid for |
//! |------|---------|-----------|
//! | `inherit` (or empty) | use this process' stream | all |
//! | `read:<path>` | read from a file | stdin |
//! | `write:<path>`, `file:<path>` | truncate and write a file | stdout, stderr |
//! | `append:<path>` | append to a file | stdout, stderr |
//! | `err2out` | merge into stdout | stderr |

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::config::BuilderIo;
use crate::core::SrcdepsError;

/// Where one standard stream goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Redirect {
    /// Inherit the stream from the current process
    #[default]
    Inherit,
    /// Read from a file
    Read(PathBuf),
    /// Truncate and write a file
    Write(PathBuf),
    /// Append to a file
    Append(PathBuf),
    /// Send stderr wherever stdout goes
    ErrToOut,
}

/// Redirects for stdin, stdout and stderr of a nested build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IoRedirects {
    stdin: Redirect,
    stdout: Redirect,
    stderr: Redirect,
}

impl IoRedirects {
    /// Inherit all three streams.
    #[must_use]
    pub fn inherit_all() -> Self {
        Self::default()
    }

    /// Validate and combine the three redirects.
    pub fn new(stdin: Redirect, stdout: Redirect, stderr: Redirect) -> Result<Self, SrcdepsError> {
        let invalid = |reason: &str| SrcdepsError::InvalidBuildRequest {
            reason: reason.to_string(),
        };
        if !matches!(stdin, Redirect::Inherit | Redirect::Read(_)) {
            return Err(invalid("stdin can only be inherited or read from a file"));
        }
        if matches!(stdout, Redirect::Read(_) | Redirect::ErrToOut) {
            return Err(invalid("stdout can only be inherited or written to a file"));
        }
        if matches!(stderr, Redirect::Read(_)) {
            return Err(invalid("stderr cannot be read from a file"));
        }
        Ok(Self {
            stdin,
            stdout,
            stderr,
        })
    }

    /// Build redirects from the `builderIo` section of a repository.
    pub fn from_builder_io(io: &BuilderIo) -> Result<Self, SrcdepsError> {
        let parse = |value: &Option<String>| value.as_deref().map_or(Ok(Redirect::Inherit), Self::parse_uri);
        Self::new(parse(&io.stdin)?, parse(&io.stdout)?, parse(&io.stderr)?)
    }

    /// Parse a single redirect URI.
    pub fn parse_uri(uri: &str) -> Result<Redirect, SrcdepsError> {
        let uri = uri.trim();
        let path = |rest: &str| -> Result<PathBuf, SrcdepsError> {
            if rest.is_empty() {
                Err(SrcdepsError::InvalidBuildRequest {
                    reason: format!("missing path in redirect '{uri}'"),
                })
            } else {
                Ok(PathBuf::from(rest))
            }
        };

        match uri {
            "" | "inherit" => return Ok(Redirect::Inherit),
            "err2out" => return Ok(Redirect::ErrToOut),
            _ => {}
        }

        if let Some(rest) = uri.strip_prefix("read:") {
            Ok(Redirect::Read(path(rest)?))
        } else if let Some(rest) = uri.strip_prefix("write:") {
            Ok(Redirect::Write(path(rest)?))
        } else if let Some(rest) = uri.strip_prefix("file:") {
            Ok(Redirect::Write(path(rest.trim_start_matches("//"))?))
        } else if let Some(rest) = uri.strip_prefix("append:") {
            Ok(Redirect::Append(path(rest)?))
        } else {
            Err(SrcdepsError::InvalidBuildRequest {
                reason: format!(
                    "unsupported redirect '{uri}': expected inherit, read:, write:, file:, append: or err2out"
                ),
            })
        }
    }

    /// The stdin redirect.
    #[must_use]
    pub fn stdin(&self) -> &Redirect {
        &self.stdin
    }

    /// The stdout redirect.
    #[must_use]
    pub fn stdout(&self) -> &Redirect {
        &self.stdout
    }

    /// The stderr redirect.
    #[must_use]
    pub fn stderr(&self) -> &Redirect {
        &self.stderr
    }

    /// Whether every stream is inherited.
    #[must_use]
    pub fn is_inherit_all(&self) -> bool {
        *self == Self::default()
    }

    /// Open the configured files and produce `(stdin, stdout, stderr)` handles.
    ///
    /// `err2out` with an inherited stdout falls back to inheriting stderr.
    pub fn open(&self) -> std::io::Result<(Stdio, Stdio, Stdio)> {
        let stdin = match &self.stdin {
            Redirect::Read(path) => Stdio::from(File::open(path)?),
            _ => Stdio::inherit(),
        };

        let stdout_file = match &self.stdout {
            Redirect::Write(path) => Some(open_output(path, false)?),
            Redirect::Append(path) => Some(open_output(path, true)?),
            _ => None,
        };

        let stderr = match &self.stderr {
            Redirect::Write(path) => Stdio::from(open_output(path, false)?),
            Redirect::Append(path) => Stdio::from(open_output(path, true)?),
            Redirect::ErrToOut => match &stdout_file {
                Some(file) => Stdio::from(file.try_clone()?),
                None => Stdio::inherit(),
            },
            _ => Stdio::inherit(),
        };

        let stdout = stdout_file.map_or_else(Stdio::inherit, Stdio::from);
        Ok((stdin, stdout, stderr))
    }
}

fn open_output(path: &Path, append: bool) -> std::io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).write(true).append(append).truncate(!append).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_uri_forms() {
        assert_eq!(IoRedirects::parse_uri("inherit").unwrap(), Redirect::Inherit);
        assert_eq!(IoRedirects::parse_uri("").unwrap(), Redirect::Inherit);
        assert_eq!(IoRedirects::parse_uri("err2out").unwrap(), Redirect::ErrToOut);
        assert_eq!(
            IoRedirects::parse_uri("read:/dev/null").unwrap(),
            Redirect::Read(PathBuf::from("/dev/null"))
        );
        assert_eq!(
            IoRedirects::parse_uri("write:/tmp/out.log").unwrap(),
            Redirect::Write(PathBuf::from("/tmp/out.log"))
        );
        assert_eq!(
            IoRedirects::parse_uri("file:///tmp/out.log").unwrap(),
            Redirect::Write(PathBuf::from("/tmp/out.log"))
        );
        assert_eq!(
            IoRedirects::parse_uri("append:build.log").unwrap(),
            Redirect::Append(PathBuf::from("build.log"))
        );
    }

    #[test]
    fn test_parse_uri_rejects_unknown() {
        assert!(IoRedirects::parse_uri("pipe:/tmp/x").is_err());
        assert!(IoRedirects::parse_uri("write:").is_err());
    }

    #[test]
    fn test_stream_validation() {
        assert!(IoRedirects::new(Redirect::ErrToOut, Redirect::Inherit, Redirect::Inherit).is_err());
        assert!(IoRedirects::new(Redirect::Inherit, Redirect::ErrToOut, Redirect::Inherit).is_err());
        assert!(
            IoRedirects::new(Redirect::Inherit, Redirect::Inherit, Redirect::Read("x".into())).is_err()
        );
        assert!(IoRedirects::new(Redirect::Inherit, Redirect::Inherit, Redirect::ErrToOut).is_ok());
    }

    #[test]
    fn test_from_builder_io() {
        let io = BuilderIo {
            stdin: None,
            stdout: Some("append:/tmp/srcdeps.log".to_string()),
            stderr: Some("err2out".to_string()),
        };
        let redirects = IoRedirects::from_builder_io(&io).unwrap();
        assert_eq!(redirects.stdin(), &Redirect::Inherit);
        assert_eq!(redirects.stdout(), &Redirect::Append(PathBuf::from("/tmp/srcdeps.log")));
        assert_eq!(redirects.stderr(), &Redirect::ErrToOut);
        assert!(!redirects.is_inherit_all());

        assert!(IoRedirects::from_builder_io(&BuilderIo::default()).unwrap().is_inherit_all());
    }

    #[test]
    fn test_open_creates_output_files() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("logs").join("out.log");
        let redirects =
            IoRedirects::new(Redirect::Inherit, Redirect::Write(out.clone()), Redirect::ErrToOut).unwrap();

        let _handles = redirects.open().unwrap();
        assert!(out.exists());
    }
}
