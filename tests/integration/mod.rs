//! Integration test suite for srcdeps
//!
//! End-to-end tests of the build coordination through the public API and the
//! `srcdeps` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **coordination**: the decision procedure against a real on-disk local repository
//! - **concurrency**: same-coordinate serialisation and distinct-coordinate parallelism
//! - **cli**: the `srcdeps` binary

mod cli;
mod concurrency;
mod coordination;
