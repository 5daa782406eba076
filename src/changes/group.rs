//! Change grouping
//!
//! One logical change can exist as several physical commits once it has been
//! amended, rebased or cherry-picked. The Change-Id tag survives all of that,
//! so it is the correlation key; content is never compared.

use crate::commits::Commit;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// All commits carrying one Change-Id, ascending by commit date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
  pub change_id: String,
  pub commits: Vec<Commit>,
}

impl Change {
  fn new(change_id: String, first: Commit) -> Self {
    Self {
      change_id,
      commits: vec![first],
    }
  }

  /// Insert keeping `commits` sorted by commit date.
  ///
  /// Binary search over the sorted list; commits with equal dates keep their
  /// insertion order.
  pub fn insert(&mut self, commit: Commit) {
    let index = self
      .commits
      .partition_point(|member| member.commit_date <= commit.commit_date);
    self.commits.insert(index, commit);
  }

  pub fn earliest_date(&self) -> Option<DateTime<FixedOffset>> {
    self.commits.first().map(|c| c.commit_date)
  }

  /// Title of the earliest commit
  pub fn title(&self) -> &str {
    self.commits.first().map(|c| c.title.as_str()).unwrap_or_default()
  }
}

/// Every change that belongs to one story
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryChangeGroup {
  pub story_id: String,
  pub changes: Vec<Change>,
}

impl StoryChangeGroup {
  pub fn earliest_date(&self) -> Option<DateTime<FixedOffset>> {
    self.changes.iter().filter_map(Change::earliest_date).min()
  }

  pub fn commits(&self) -> impl Iterator<Item = &Commit> {
    self.changes.iter().flat_map(|change| change.commits.iter())
  }
}

/// Group commits by Change-Id, ordered by each change's earliest commit date.
///
/// Commits without a Change-Id cannot be correlated and are skipped.
pub fn group_by_change_id(commits: impl IntoIterator<Item = Commit>) -> Vec<Change> {
  let mut changes: Vec<Change> = Vec::new();

  for commit in commits {
    let Some(change_id) = commit.change_id.clone() else {
      tracing::debug!(sha = commit.short_sha(), "commit has no Change-Id, skipping");
      continue;
    };

    match changes.iter_mut().find(|change| change.change_id == change_id) {
      Some(change) => change.insert(commit),
      None => changes.push(Change::new(change_id, commit)),
    }
  }

  // stable: ties keep discovery order
  changes.sort_by_key(Change::earliest_date);
  changes
}

/// Group commits by Story-Id, then by Change-Id within each story.
///
/// Story groups are ordered by their earliest change; commits without a
/// Story-Id are skipped.
pub fn group_by_story_id(commits: impl IntoIterator<Item = Commit>) -> Vec<StoryChangeGroup> {
  let mut buckets: Vec<(String, Vec<Commit>)> = Vec::new();

  for commit in commits {
    let Some(story_id) = commit.story_id.clone() else {
      tracing::debug!(sha = commit.short_sha(), "commit has no Story-Id, skipping");
      continue;
    };

    match buckets.iter_mut().find(|(id, _)| *id == story_id) {
      Some((_, bucket)) => bucket.push(commit),
      None => buckets.push((story_id, vec![commit])),
    }
  }

  let mut groups: Vec<StoryChangeGroup> = buckets
    .into_iter()
    .map(|(story_id, commits)| StoryChangeGroup {
      story_id,
      changes: group_by_change_id(commits),
    })
    .filter(|group| !group.changes.is_empty())
    .collect();

  groups.sort_by_key(StoryChangeGroup::earliest_date);
  groups
}
