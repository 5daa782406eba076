//! Story command implementation

use super::release::dedup_ids;
use crate::core::context::WorkflowContext;
use crate::core::error::FlowResult;
use crate::story::{changes, finish, start};

/// Branch off trunk for a story and mark it started
pub fn run_story_start(ctx: &WorkflowContext, id: String) -> FlowResult<()> {
  start::run(ctx, id.trim())
}

/// Mark a story implemented
pub fn run_story_finish(ctx: &WorkflowContext, id: String) -> FlowResult<()> {
  finish::run(ctx, id.trim())
}

/// List the changes of one or more stories
pub fn run_story_changes(ctx: &WorkflowContext, stories: Vec<String>, json: bool) -> FlowResult<()> {
  let stories = dedup_ids(stories)?;
  changes::run(ctx, &stories, json)
}
