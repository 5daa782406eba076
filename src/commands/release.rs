//! Release command implementation

use crate::core::context::WorkflowContext;
use crate::core::error::{FlowError, FlowResult};
use crate::release::{cherry_pick, deploy, stage, start};

/// Cut the release branch from trunk and bump trunk
pub fn run_release_start(ctx: &WorkflowContext) -> FlowResult<()> {
  start::run(ctx)
}

/// Promote the release branch to staging and tag it
pub fn run_release_stage(ctx: &WorkflowContext) -> FlowResult<()> {
  stage::run(ctx)
}

/// Point stable at the staged release
pub fn run_release_deploy(ctx: &WorkflowContext) -> FlowResult<()> {
  deploy::run(ctx)
}

/// Bring the given stories' missing changes onto the release branch
pub fn run_release_cherry_pick(ctx: &WorkflowContext, stories: Vec<String>, dry_run: bool) -> FlowResult<()> {
  let stories = dedup_ids(stories)?;
  cherry_pick::run(ctx, &stories, dry_run)
}

/// Trim and de-duplicate story ids, keeping their order
pub(crate) fn dedup_ids(ids: Vec<String>) -> FlowResult<Vec<String>> {
  let mut unique: Vec<String> = Vec::new();
  for id in ids.into_iter().map(|id| id.trim().to_string()) {
    if !id.is_empty() && !unique.contains(&id) {
      unique.push(id);
    }
  }
  if unique.is_empty() {
    return Err(FlowError::message("At least one story id is required"));
  }
  Ok(unique)
}
