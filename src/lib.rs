//! srcdeps - build source dependencies on demand
//!
//! A dependency whose version names a source-control reference, such as
//! `1.2.3-SRC-branch-main`, `2.0-SRC-tag-v2.0` or `1.0-SRC-revision-3f2a9c1`, is
//! not downloaded from a binary repository. srcdeps checks it out and builds it
//! into the local repository instead, right before the dependency is resolved.
//!
//! # Architecture Overview
//!
//! ```text
//! resolution engine
//!        │ on_dependency(g:a:v)
//!        ▼
//! ResolutionInterceptor ── not a source version ──> pass through
//!        │
//!        ▼
//! BuildCoordinator ──> LocalStore          (is g:a:v installed?)
//!        ├───────────> RepositoryFinder    (which repository builds it?)
//!        ├───────────> BuildDirectoriesManager (exclusive workspace)
//!        └───────────> BuildService        (checkout + build)
//! ```
//!
//! The coordinator guarantees at most one build per repository and source
//! version at a time, across tasks and processes, and re-checks the local
//! store before, during and after each build.
//!
//! # Core Modules
//!
//! - [`resolver`] - the interceptor called for every dependency
//! - [`coordinator`] - the build-if-necessary decision procedure
//! - [`store`] - local repository probes
//! - [`workspace`] - locked build workspaces
//! - [`build`] - build requests, stream redirects and the Git/Maven build service
//! - [`config`] - `srcdeps.yaml` loading and repository lookup
//! - [`version`] - source version classification and parsing
//!
//! ## Supporting Modules
//! - [`core`] - coordinates and error handling
//! - [`cli`] - the `srcdeps` command line
//! - [`utils`] - platform helpers
//! - [`constants`] - shared names and defaults
//!
//! # Configuration (srcdeps.yaml)
//!
//! ```yaml
//! configModelVersion: 2.2
//! forwardProperties: [ "SRCDEPS_*" ]
//! buildTimeout: 30m
//! repositories:
//!   org.example:
//!     selectors: [ "org.example" ]
//!     urls: [ "git:https://github.com/example/example.git" ]
//!     buildArguments: [ "-Pfast" ]
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! srcdeps build org.example:foo:1.2.3-SRC-branch-main
//! srcdeps classify 1.2.3-SRC-tag-v1.2.3
//! ```

pub mod build;
pub mod cli;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod core;
pub mod resolver;
pub mod store;
pub mod utils;
pub mod version;
pub mod workspace;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
