//! Structured file system error handling
//!
//! Captures what was being done to which path at the operation site, rather than
//! reconstructing it from an `io::Error` message later.

use std::path::PathBuf;
use thiserror::Error;

/// File operation being performed when an error occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    /// Reading file contents
    Read,
    /// Creating or opening a file for writing
    Write,
    /// Creating a directory
    CreateDir,
    /// Locking a file
    Lock,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::CreateDir => write!(f, "creating directory"),
            FileOperation::Lock => write!(f, "locking"),
        }
    }
}

/// A file operation failure with the context it happened in
#[derive(Error, Debug)]
#[error("File operation failed: {operation} {} for {purpose} ({caller})", .file_path.display())]
pub struct FileOperationError {
    /// The operation that failed
    pub operation: FileOperation,
    /// The path that was operated on
    pub file_path: PathBuf,
    /// Why the operation was performed
    pub purpose: String,
    /// Function that performed the operation
    pub caller: String,
    /// The underlying IO error
    #[source]
    pub source: std::io::Error,
}

impl FileOperationError {
    /// A short hint for the most common failure kinds.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self.source.kind() {
            std::io::ErrorKind::NotFound => Some("the path does not exist"),
            std::io::ErrorKind::PermissionDenied => Some("permission denied"),
            std::io::ErrorKind::InvalidData => Some("the file is not valid UTF-8"),
            _ => None,
        }
    }
}

/// Extension trait for adding file context to `io::Result`
pub trait FileResultExt<T> {
    /// Attach the operation, path, purpose and caller to an IO error.
    fn with_file_context(
        self,
        operation: FileOperation,
        file_path: impl Into<PathBuf>,
        purpose: impl Into<String>,
        caller: impl Into<String>,
    ) -> Result<T, FileOperationError>;
}

impl<T> FileResultExt<T> for Result<T, std::io::Error> {
    fn with_file_context(
        self,
        operation: FileOperation,
        file_path: impl Into<PathBuf>,
        purpose: impl Into<String>,
        caller: impl Into<String>,
    ) -> Result<T, FileOperationError> {
        self.map_err(|source| FileOperationError {
            operation,
            file_path: file_path.into(),
            purpose: purpose.into(),
            caller: caller.into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_with_file_context_wraps_error() {
        let result: Result<(), Error> = Err(Error::new(ErrorKind::NotFound, "gone"));
        let err = result
            .with_file_context(
                FileOperation::Read,
                "/tmp/srcdeps.yaml",
                "loading configuration",
                "config::load",
            )
            .unwrap_err();

        assert_eq!(err.operation, FileOperation::Read);
        assert_eq!(err.hint(), Some("the path does not exist"));
        let message = err.to_string();
        assert!(message.contains("reading"));
        assert!(message.contains("/tmp/srcdeps.yaml"));
        assert!(message.contains("loading configuration"));
    }

    #[test]
    fn test_with_file_context_passes_ok_through() {
        let result: Result<u8, Error> = Ok(7);
        let value = result
            .with_file_context(FileOperation::Write, "/tmp/x", "test", "test")
            .unwrap();
        assert_eq!(value, 7);
    }
}
