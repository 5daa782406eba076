//! Cherry-pick planning
//!
//! Reconciles story changes against the commits a target branch can already
//! reach. A change counts as present as soon as any one of its physical
//! commits is reachable, whatever SHA the target holds it under.

use super::group::{Change, StoryChangeGroup};
use crate::commits::Commit;
use crate::core::error::{FlowError, FlowResult, UnverifiedChange};
use std::collections::HashSet;

/// Changes of one story split by presence on the target
#[derive(Debug)]
pub struct Presence<'a> {
  pub story_id: &'a str,
  pub present: Vec<&'a Change>,
  pub missing: Vec<&'a Change>,
}

/// Plans which trunk commits a release branch still needs
pub struct CherryPickPlanner {
  trunk_refs: Vec<String>,
}

impl CherryPickPlanner {
  /// `trunk_refs` are the ref names whose commits count as trunk lineage
  pub fn new(trunk_refs: Vec<String>) -> Self {
    Self { trunk_refs }
  }

  fn is_trunk(&self, commit: &Commit) -> bool {
    self.trunk_refs.iter().any(|name| *name == commit.source)
  }

  /// Partition every group's changes into present and missing
  pub fn presence<'a>(groups: &'a [StoryChangeGroup], reachable: &HashSet<String>) -> Vec<Presence<'a>> {
    groups
      .iter()
      .map(|group| {
        let (present, missing): (Vec<&Change>, Vec<&Change>) = group
          .changes
          .iter()
          .partition(|change| change.commits.iter().any(|c| reachable.contains(&c.sha)));
        Presence {
          story_id: &group.story_id,
          present,
          missing,
        }
      })
      .collect()
  }

  /// Groups reduced to their missing changes; fully present groups are dropped
  pub fn missing_changes(groups: &[StoryChangeGroup], reachable: &HashSet<String>) -> Vec<StoryChangeGroup> {
    Self::presence(groups, reachable)
      .into_iter()
      .filter(|presence| !presence.missing.is_empty())
      .map(|presence| StoryChangeGroup {
        story_id: presence.story_id.to_string(),
        changes: presence.missing.into_iter().cloned().collect(),
      })
      .collect()
  }

  /// Missing changes, rejecting any that trunk never saw.
  ///
  /// Every missing change needs at least one trunk-sourced commit. Otherwise
  /// the whole plan fails and lists each offending change.
  pub fn plan(&self, groups: &[StoryChangeGroup], reachable: &HashSet<String>) -> FlowResult<Vec<StoryChangeGroup>> {
    let missing = Self::missing_changes(groups, reachable);

    let offending: Vec<UnverifiedChange> = missing
      .iter()
      .flat_map(|group| {
        group
          .changes
          .iter()
          .filter(|change| !change.commits.iter().any(|c| self.is_trunk(c)))
          .map(|change| UnverifiedChange {
            story_id: group.story_id.clone(),
            change_id: change.change_id.clone(),
            commits: change
              .commits
              .iter()
              .map(|c| (c.sha.clone(), c.source.clone()))
              .collect(),
          })
      })
      .collect();

    if !offending.is_empty() {
      return Err(FlowError::Reachability(offending));
    }
    Ok(missing)
  }

  /// Trunk-sourced commits of a plan, ascending by commit date.
  ///
  /// Merge commits are left out; they cannot be replayed without a mainline.
  pub fn commits_to_pick<'a>(&self, plan: &'a [StoryChangeGroup]) -> Vec<&'a Commit> {
    let mut seen = HashSet::new();
    let mut picks: Vec<&Commit> = plan
      .iter()
      .flat_map(StoryChangeGroup::commits)
      .filter(|commit| self.is_trunk(commit))
      .filter(|commit| {
        if commit.is_merge() {
          tracing::warn!(sha = commit.short_sha(), "skipping merge commit");
          return false;
        }
        true
      })
      .filter(|commit| seen.insert(commit.sha.as_str()))
      .collect();

    picks.sort_by_key(|commit| commit.commit_date);
    picks
  }
}
