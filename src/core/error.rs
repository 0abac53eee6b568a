//! Error handling for srcdeps
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** ([`SrcdepsError`]) so callers can tell a missing
//!    repository apart from a failed build
//! 2. **User-friendly messages** ([`ErrorContext`]) with suggestions for the CLI
//!
//! # Propagation
//!
//! Only configuration problems and lookup failures (no repository for a
//! coordinate, malformed source version) leave the build coordinator as errors.
//! Failures while a workspace lock is held are logged and turned into a
//! [`BuildOutcome`](crate::coordinator::BuildOutcome) instead, so that the
//! dependency simply stays unresolved.
//!
//! # Examples
//!
//! ```rust,no_run
//! use srcdeps::core::{SrcdepsError, user_friendly_error};
//!
//! let error = SrcdepsError::RepositoryNotFound {
//!     group: "org.example".to_string(),
//!     artifact: "foo".to_string(),
//!     version: "1.0-SRC-branch-main".to_string(),
//! };
//! user_friendly_error(anyhow::Error::from(error)).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::core::file_error::FileOperationError;

/// The main error type for srcdeps operations
#[derive(Error, Debug)]
pub enum SrcdepsError {
    /// The configuration file exists but could not be read or parsed.
    #[error("Configuration unavailable at {path}: {reason}")]
    ConfigurationUnavailable {
        /// Location of the configuration file
        path: String,
        /// Why reading or parsing failed
        reason: String,
    },

    /// No configured SCM repository matches the requested coordinate.
    #[error("No srcdeps repository configured for {group}:{artifact}:{version}")]
    RepositoryNotFound {
        /// Requested group
        group: String,
        /// Requested artifact
        artifact: String,
        /// Requested version
        version: String,
    },

    /// A version string could not be parsed as a source version.
    #[error("Invalid source version '{version}': {reason}")]
    InvalidSourceVersion {
        /// The offending version string
        version: String,
        /// What is wrong with it
        reason: String,
    },

    /// A `group:artifact:version` string could not be parsed.
    #[error("Invalid dependency coordinate '{coordinate}': {reason}")]
    InvalidCoordinate {
        /// The offending coordinate string
        coordinate: String,
        /// What is wrong with it
        reason: String,
    },

    /// A build request was assembled without a mandatory field.
    #[error("Invalid build request: {reason}")]
    InvalidBuildRequest {
        /// The missing or invalid field
        reason: String,
    },

    /// A step of the source build (checkout or build tool) failed.
    #[error("Build step '{operation}' failed")]
    BuildFailed {
        /// The step that failed (e.g. "git clone", "mvn")
        operation: String,
        /// Output or description of the failure
        reason: String,
    },

    /// A step of the source build exceeded its time budget.
    #[error("Build step '{operation}' timed out after {seconds} seconds")]
    BuildTimeout {
        /// The step that timed out
        operation: String,
        /// The time budget in seconds
        seconds: u64,
    },

    /// A required executable is not installed.
    #[error("Required tool '{tool}' is not installed or not found in PATH")]
    ToolNotFound {
        /// Name of the executable
        tool: String,
    },

    /// A build workspace lock could not be acquired.
    #[error("Failed to lock build directory {path}: {reason}")]
    LockFailed {
        /// Workspace path that was being locked
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// File operation with structured context.
    #[error(transparent)]
    FileOperation(#[from] FileOperationError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Error wrapper carrying a suggestion and details for display in a terminal.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: anyhow::Error,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without any extra context.
    #[must_use]
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colours.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<SrcdepsError>() {
        Ok(srcdeps_error) => return create_error_context(srcdeps_error),
        Err(error) => error,
    };

    let io_kind = error.downcast_ref::<std::io::Error>().map(std::io::Error::kind);
    match io_kind {
        Some(std::io::ErrorKind::PermissionDenied) => ErrorContext::new(error)
            .with_suggestion("Check ownership and permissions of the local repository and build root"),
        Some(std::io::ErrorKind::NotFound) => ErrorContext::new(error)
            .with_suggestion("Check that the file or directory exists and the path is correct"),
        _ => ErrorContext::new(error),
    }
}

fn create_error_context(error: SrcdepsError) -> ErrorContext {
    match &error {
        SrcdepsError::ConfigurationUnavailable { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Check the YAML syntax of srcdeps.yaml, or point SRCDEPS_YAML_PATH at a valid file")
                .with_details("A missing configuration file falls back to an empty configuration, an unreadable one does not")
        }
        SrcdepsError::RepositoryNotFound { group, .. } => {
            let suggestion = format!(
                "Add a repository to srcdeps.yaml whose selectors match '{group}', e.g. `selectors: [\"{group}:*\"]`"
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Source versions can only be built when srcdeps knows where their sources live")
        }
        SrcdepsError::InvalidSourceVersion { .. } => ErrorContext::new(error)
            .with_suggestion("Use the form <version>-SRC-<branch|tag|revision>-<ref>, e.g. 1.2.3-SRC-branch-main"),
        SrcdepsError::InvalidCoordinate { .. } => ErrorContext::new(error)
            .with_suggestion("Pass dependencies as group:artifact:version"),
        SrcdepsError::ToolNotFound { tool } => {
            let suggestion = format!("Install '{tool}' and make sure it is on your PATH");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        SrcdepsError::BuildTimeout { .. } => ErrorContext::new(error)
            .with_suggestion("Raise buildTimeout for this repository in srcdeps.yaml"),
        SrcdepsError::FileOperation(file_error) => {
            let hint = file_error.hint().map(str::to_string);
            let context = ErrorContext::new(error);
            match hint {
                Some(hint) => context.with_details(hint),
                None => context,
            }
        }
        SrcdepsError::LockFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Check that the build root is writable; set SRCDEPS_BUILD_ROOT to relocate it"),
        _ => ErrorContext::new(error),
    }
}
