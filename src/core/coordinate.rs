//! Dependency coordinates as requested by the resolution engine.

use std::fmt;
use std::str::FromStr;

use crate::core::SrcdepsError;

/// A requested dependency: `group:artifact:version`.
///
/// Coordinates are plain values; many of them may share a group or a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyCoordinate {
    group: String,
    artifact: String,
    version: String,
}

impl DependencyCoordinate {
    /// Create a coordinate from its three parts.
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    /// The group (Maven `groupId`).
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The artifact name (Maven `artifactId`).
    #[must_use]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// The raw requested version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for DependencyCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

impl FromStr for DependencyCoordinate {
    type Err = SrcdepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| SrcdepsError::InvalidCoordinate {
            coordinate: s.to_string(),
            reason: reason.to_string(),
        };

        // Anything after the second ':' belongs to the version.
        let mut parts = s.trim().splitn(3, ':');
        let group = parts.next().unwrap_or_default();
        let artifact = parts.next().ok_or_else(|| invalid("missing artifact"))?;
        let version = parts.next().ok_or_else(|| invalid("missing version"))?;

        if group.is_empty() || artifact.is_empty() || version.is_empty() {
            return Err(invalid("group, artifact and version must all be non-empty"));
        }

        Ok(Self::new(group, artifact, version))
    }
}
