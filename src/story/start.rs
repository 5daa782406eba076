//! `story start`: create the story branch and mark the story started

use super::{find_story, story_branch};
use crate::action::{ActionChain, GitAction, GitUndo, ReportAction};
use crate::core::context::WorkflowContext;
use crate::core::error::{FlowError, FlowResult};
use crate::release::{branch_refspec, stories};
use crate::tracker::StoryState;

pub fn run(ctx: &WorkflowContext, id: &str) -> FlowResult<()> {
  let branches = ctx.branches();
  let git = &ctx.git;
  let branch = story_branch(ctx, id);

  println!("🌱 Starting story {}", id);

  ActionChain::run(|chain| {
    ctx.begin(chain)?;
    ctx.fetch()?;

    let tracker = ctx.tracker();
    let story = find_story(tracker.as_ref(), id)?;
    stories::require_states(&[id.to_string()], std::slice::from_ref(&story), "new", |state| {
      state == StoryState::New
    })?;

    if git.ref_exists(&format!("refs/heads/{}", branch))? {
      return Err(FlowError::with_help(
        format!("Branch '{}' already exists", branch),
        format!("Check it out with 'git checkout {}'.", branch),
      ));
    }

    git.create_branch_at(&branch, &branches.trunk)?;
    chain.push_task(
      format!("create {}", branch),
      GitAction::new(git, GitUndo::DeleteBranch { name: branch.clone() }),
    );
    println!("   🌿 Created '{}' from '{}'", branch, branches.trunk);

    let undo = story.start()?;
    chain.push_task(format!("start story {}", id), undo);

    git.push(&branches.remote, &[branch_refspec(&branch)], false)?;
    chain.push(ReportAction::new(format!(
      "'{}' was already pushed to '{}'; delete it there by hand",
      branch, branches.remote
    )));

    Ok(())
  })?;

  if let Err(e) = git.checkout(&branch) {
    tracing::warn!(branch = %branch, error = %e, "could not check out story branch");
    println!("   ⚠️  Could not check out '{}': {}", branch, e);
  }
  println!();
  println!("✅ Story {} started on '{}'", id, branch);
  Ok(())
}
