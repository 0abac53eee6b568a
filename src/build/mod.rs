//! Building source versions.
//!
//! The coordinator hands a [`BuildRequest`] to a [`BuildService`] while it holds
//! the workspace lock. [`ScmBuildService`] is the default service: it checks out
//! the requested reference with Git and installs the project with Maven, using
//! [`BuildCommand`](command::BuildCommand) for every external process.

pub mod command;
mod io;
mod request;
mod service;

pub use io::{IoRedirects, Redirect};
pub use request::{BuildRequest, BuildRequestBuilder};
pub use service::{
    ScmBuildService, checkout_reference, forwarded_properties, maven_arguments, version_set_arguments,
};

use async_trait::async_trait;

use crate::core::SrcdepsError;

/// Checks out and builds a source version into the local artifact store.
///
/// Implementations run inside the caller's workspace lock and may take a long
/// time; they must honour [`BuildRequest::timeout`].
#[async_trait]
pub trait BuildService: Send + Sync {
    /// Build `request`, returning once the artifacts are installed or the build failed.
    async fn build(&self, request: &BuildRequest) -> Result<(), SrcdepsError>;
}
