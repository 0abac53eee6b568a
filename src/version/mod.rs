//! Source version classification and parsing.
//!
//! A *source version* is a dependency version that names a source-control
//! reference instead of a published artifact:
//!
//! ```text
//! 1.2.3-SRC-branch-main
//! 1.2.3-SRC-tag-v1.2.3
//! 1.2.3-SRC-revision-4c9e1d0f
//! └─┬─┘    └──┬───┘ └──┬───┘
//!  base      kind     reference
//! ```
//!
//! Everything that does not match this shape goes through the ordinary binary
//! resolution path untouched.
//!
//! # Examples
//!
//! ```rust
//! use srcdeps::version::{is_source_version, ScmRefKind, SourceVersion};
//!
//! assert!(is_source_version("1.2.3-SRC-branch-main"));
//! assert!(!is_source_version("1.2.3"));
//!
//! let version = SourceVersion::parse("1.2.3-SRC-branch-main").unwrap();
//! assert_eq!(version.base(), "1.2.3");
//! assert_eq!(version.kind(), ScmRefKind::Branch);
//! assert_eq!(version.scm_ref(), "main");
//! ```

use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::core::SrcdepsError;

/// Marker separating the base version from the SCM reference.
pub const SRC_MARKER: &str = "-SRC-";

static SOURCE_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>.+?)-SRC-(?P<kind>branch|tag|revision)-(?P<reference>.+)$")
        .expect("source version pattern is valid")
});

/// The kind of SCM reference a source version points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScmRefKind {
    /// A branch head, e.g. `main`
    Branch,
    /// A tag, e.g. `v1.2.3`
    Tag,
    /// A commit id
    Revision,
}

impl ScmRefKind {
    /// The keyword used in version strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::Tag => "tag",
            Self::Revision => "revision",
        }
    }
}

impl fmt::Display for ScmRefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScmRefKind {
    type Err = SrcdepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "branch" => Ok(Self::Branch),
            "tag" => Ok(Self::Tag),
            "revision" => Ok(Self::Revision),
            other => Err(SrcdepsError::InvalidSourceVersion {
                version: other.to_string(),
                reason: "expected one of branch, tag, revision".to_string(),
            }),
        }
    }
}

/// Returns true when `version` encodes a source-control reference.
///
/// This is the only predicate deciding whether a dependency takes the source
/// build path.
#[must_use]
pub fn is_source_version(version: &str) -> bool {
    SOURCE_VERSION_RE.is_match(version)
}

/// A parsed source version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceVersion {
    raw: String,
    base: String,
    kind: ScmRefKind,
    reference: String,
}

impl SourceVersion {
    /// Parse a version string of the form `<base>-SRC-<kind>-<reference>`.
    pub fn parse(version: &str) -> Result<Self, SrcdepsError> {
        let captures = SOURCE_VERSION_RE.captures(version).ok_or_else(|| {
            let reason = if version.contains(SRC_MARKER) {
                "expected <version>-SRC-<branch|tag|revision>-<reference>"
            } else {
                "not a source version"
            };
            SrcdepsError::InvalidSourceVersion {
                version: version.to_string(),
                reason: reason.to_string(),
            }
        })?;

        Ok(Self {
            raw: version.to_string(),
            base: captures["base"].to_string(),
            kind: captures["kind"].parse()?,
            reference: captures["reference"].to_string(),
        })
    }

    /// The full version string as requested.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The version part before the `-SRC-` marker.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Whether the reference is a branch, tag or revision.
    #[must_use]
    pub const fn kind(&self) -> ScmRefKind {
        self.kind
    }

    /// The branch name, tag name or commit id.
    #[must_use]
    pub fn scm_ref(&self) -> &str {
        &self.reference
    }

    /// Relative directory of this version's build workspace: `<base>/<kind>-<reference>`.
    ///
    /// Distinct versions always map to distinct directories. Bytes outside
    /// `[A-Za-z0-9._-]` are written as `%XX` (including `%` itself), so branch
    /// names with `/` stay a single path component.
    #[must_use]
    pub fn workspace_dir(&self) -> PathBuf {
        let leaf = format!("{}-{}", self.kind, escape_path_component(&self.reference));
        PathBuf::from(escape_path_component(&self.base)).join(leaf)
    }
}

/// Escape `value` into one portable path component.
///
/// `.` and `..` are escaped as well so the result never walks out of its parent.
fn escape_path_component(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_') {
            escaped.push(char::from(byte));
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    if escaped.bytes().all(|b| b == b'.') {
        return escaped.replace('.', "%2E");
    }
    escaped
}

impl fmt::Display for SourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for SourceVersion {
    type Err = SrcdepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
