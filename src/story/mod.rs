//! Per-story workflows
//!
//! - **start**: branch off trunk and mark the story started
//! - **finish**: mark the story implemented
//! - **changes**: list a story's changes and whether the release has them

pub mod changes;
pub mod finish;
pub mod start;

use crate::core::context::WorkflowContext;
use crate::core::error::{FlowError, FlowResult};
use crate::tracker::{IssueTracker, Story};

/// Look up one story, failing when the tracker does not know it
pub(crate) fn find_story(tracker: &dyn IssueTracker, id: &str) -> FlowResult<Box<dyn Story>> {
  tracker
    .list_stories_by_tag(&[id.to_string()])?
    .into_iter()
    .next()
    .ok_or_else(|| FlowError::message(format!("Story '{}' is unknown to the issue tracker", id)))
}

/// Name of the branch `story start` creates for `id`
pub(crate) fn story_branch(ctx: &WorkflowContext, id: &str) -> String {
  format!("{}{}", ctx.branches().story_prefix, id)
}
