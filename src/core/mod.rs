//! Core building blocks shared by every workflow
//!
//! - **config**: trunkflow.toml parsing and validation
//! - **context**: repository, git handle and config built once per invocation
//! - **error**: error types with contextual help messages and exit codes
//! - **logging**: tracing subscriber setup
//! - **vcs**: git operations (SystemGit) and branch state

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod vcs;
