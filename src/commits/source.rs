//! Source attribution
//!
//! `git log --source` reports whichever ref the walk happened to reach a
//! commit through, which depends on argument order. Workflows need a stable
//! answer, so every commit is re-attributed to the first ref of a fixed
//! priority list (trunk, trunk upstream, release, release upstream) that can
//! reach it.

use super::Commit;
use crate::core::config::BranchConfig;
use crate::core::error::FlowResult;
use crate::core::vcs::SystemGit;
use std::collections::HashSet;

/// Reachable SHA sets for refs in priority order
pub struct SourceIndex {
  refs: Vec<(String, HashSet<String>)>,
}

impl SourceIndex {
  pub fn new(refs: Vec<(String, HashSet<String>)>) -> Self {
    Self { refs }
  }

  /// Query git for each ref of the configured priority list.
  ///
  /// Refs that do not exist are skipped, so a missing release branch never
  /// attributes anything.
  pub fn load(git: &SystemGit, branches: &BranchConfig) -> FlowResult<Self> {
    let mut refs = Vec::new();
    for name in branches.source_priority() {
      if !git.ref_exists(&name)? {
        tracing::debug!(reference = %name, "skipping missing ref during source attribution");
        continue;
      }
      let reachable = git.reachable_shas(&name)?;
      refs.push((name, reachable));
    }
    Ok(Self::new(refs))
  }

  /// First ref in priority order that reaches `sha`
  pub fn source_of(&self, sha: &str) -> Option<&str> {
    self
      .refs
      .iter()
      .find(|(_, reachable)| reachable.contains(sha))
      .map(|(name, _)| name.as_str())
  }

  /// Overwrite each commit's source; commits no ref reaches keep theirs
  pub fn attribute(&self, commits: &mut [Commit]) {
    for commit in commits.iter_mut() {
      match self.source_of(&commit.sha) {
        Some(name) => commit.source = name.to_string(),
        None => tracing::debug!(
          sha = commit.short_sha(),
          source = %commit.source,
          "commit not reachable from any tracked ref, keeping log source"
        ),
      }
    }
  }
}
