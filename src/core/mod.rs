//! Core types shared across srcdeps
//!
//! - [`DependencyCoordinate`] - the `group:artifact:version` triple handed over by
//!   the resolution engine
//! - [`SrcdepsError`] - typed errors for every failure mode
//! - [`ErrorContext`] / [`user_friendly_error`] - terminal-friendly error display
//! - [`file_error`] - IO errors annotated with the operation and path involved

mod coordinate;
pub mod error;
pub mod file_error;

pub use coordinate::DependencyCoordinate;
pub use error::{ErrorContext, SrcdepsError, user_friendly_error};
pub use file_error::{FileOperation, FileOperationError, FileResultExt};
