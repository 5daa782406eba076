//! Stories referenced by a commit range and their tracker states

use crate::commits::{self, Commit, STORY_ID_TAG};
use crate::core::error::{FlowError, FlowResult, StoryStateMismatch};
use crate::core::vcs::SystemGit;
use crate::tracker::{IssueTracker, Story, StoryState};

/// `from..to`, or everything reachable from `to` when `from` does not exist yet
pub fn range(git: &SystemGit, from: &str, to: &str) -> FlowResult<String> {
  if git.ref_exists(from)? {
    Ok(format!("{}..{}", from, to))
  } else {
    tracing::debug!(from, "range start does not exist, using full history");
    Ok(to.to_string())
  }
}

/// Commits reachable from `revisions` that carry a Story-Id tag, oldest first
pub fn tagged_commits(git: &SystemGit, revisions: &[&str]) -> FlowResult<Vec<Commit>> {
  let raw = git.log_raw(revisions, &[format!("^{}:", STORY_ID_TAG)])?;
  let commits = commits::parse(&raw)?;
  Ok(commits.into_iter().filter(|c| c.story_id.is_some()).collect())
}

/// Distinct story ids in order of first appearance
pub fn story_ids(commits: &[Commit]) -> Vec<String> {
  let mut ids: Vec<String> = Vec::new();
  for id in commits.iter().filter_map(|c| c.story_id.as_ref()) {
    if !ids.contains(id) {
      ids.push(id.clone());
    }
  }
  ids
}

/// Stories referenced in `range`, looked up in the tracker
pub fn stories_in_range(
  git: &SystemGit,
  tracker: &dyn IssueTracker,
  range: &str,
) -> FlowResult<(Vec<String>, Vec<Box<dyn Story>>)> {
  let ids = story_ids(&tagged_commits(git, &[range])?);
  let stories = tracker.list_stories_by_tag(&ids)?;
  Ok((ids, stories))
}

/// Fail unless every id names a story whose state satisfies `accept`.
///
/// Ids the tracker does not know count as mismatches too.
pub fn require_states(
  ids: &[String],
  stories: &[Box<dyn Story>],
  expected: &str,
  accept: impl Fn(StoryState) -> bool,
) -> FlowResult<()> {
  let mismatches: Vec<StoryStateMismatch> = ids
    .iter()
    .filter_map(|id| {
      let actual = match stories.iter().find(|s| s.readable_id() == id.as_str()) {
        Some(story) if accept(story.state()) => return None,
        Some(story) => story.state().to_string(),
        None => "unknown".to_string(),
      };
      Some(StoryStateMismatch {
        story_id: id.clone(),
        actual,
        expected: expected.to_string(),
      })
    })
    .collect();

  if !mismatches.is_empty() {
    return Err(FlowError::StoryState(mismatches));
  }
  Ok(())
}

/// Print one line per story
pub fn print_stories(stories: &[Box<dyn Story>]) {
  for story in stories {
    println!("   • {} [{}] {}", story.readable_id(), story.state(), story.title());
  }
}
