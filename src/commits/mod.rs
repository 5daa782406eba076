//! Commit records and the commit-log grammar
//!
//! - **parser**: turns `git log`/`git show` output into [`Commit`]s
//! - **source**: attributes each commit to the long-lived ref it came from

pub mod parser;
pub mod source;

pub use parser::parse;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;

/// Tag correlating physical commits that form one logical change
pub const CHANGE_ID_TAG: &str = "Change-Id";
/// Tag linking a commit to an issue-tracker story
pub const STORY_ID_TAG: &str = "Story-Id";

/// Author or committer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
  pub name: String,
  pub email: String,
}

impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} <{}>", self.name, self.email)
  }
}

/// One physical commit as reported by `git log --pretty=fuller`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
  pub sha: String,
  /// Parent SHAs from the `Merge:` line; None for ordinary commits
  pub merge: Option<Vec<String>>,
  pub author: Identity,
  pub author_date: DateTime<FixedOffset>,
  pub committer: Identity,
  pub commit_date: DateTime<FixedOffset>,
  pub title: String,
  /// Message lines after the title, indentation stripped
  pub body: Vec<String>,
  pub change_id: Option<String>,
  pub story_id: Option<String>,
  /// Ref the commit was reached through
  pub source: String,
}

impl Commit {
  pub fn is_merge(&self) -> bool {
    self.merge.is_some()
  }

  pub fn short_sha(&self) -> &str {
    crate::core::error::short_sha(&self.sha)
  }
}
