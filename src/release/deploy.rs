//! `release deploy`: move stable to the staged release

use super::{forced_refspec, require_ref, return_to, stories, version};
use crate::action::{ActionChain, GitAction, GitUndo, ReportAction};
use crate::core::context::WorkflowContext;
use crate::core::error::{FlowError, FlowResult};
use crate::tracker::StoryState;

pub fn run(ctx: &WorkflowContext) -> FlowResult<()> {
  let branches = ctx.branches();
  let git = &ctx.git;

  println!("🚢 Deploying '{}' to '{}'", branches.staging, branches.stable);

  let (original, release_version) = ActionChain::run(|chain| {
    let original = ctx.begin(chain)?;
    ctx.fetch()?;

    let staging_upstream = branches.upstream(&branches.staging);
    let staging_tip = require_ref(ctx, &staging_upstream, "Run 'trunkflow release stage' first.")?;

    let release_version = version::release_version(&version::version_at(git, &ctx.config.version, &staging_upstream)?);
    let tag = version::tag_name(&release_version);
    if !git.tag_exists(&tag)? {
      return Err(FlowError::with_help(
        format!("Tag '{}' does not exist", tag),
        "Only staged releases can be deployed; run 'trunkflow release stage' first.",
      ));
    }
    println!("   Release version: {}", release_version);

    let range = stories::range(git, &branches.upstream(&branches.stable), &staging_upstream)?;
    let tracker = ctx.tracker();
    let (ids, found) = stories::stories_in_range(git, tracker.as_ref(), &range)?;
    stories::require_states(&ids, &found, "staged", |state| state == StoryState::Staged)?;
    stories::print_stories(&found);

    let stable_ref = format!("refs/heads/{}", branches.stable);
    match git.rev_parse(&stable_ref)? {
      Some(previous_sha) => {
        git.reset_branch(&branches.stable, &staging_tip)?;
        chain.push_task(
          format!("reset {}", branches.stable),
          GitAction::new(git, GitUndo::ResetBranch {
            name: branches.stable.clone(),
            previous_sha,
          }),
        );
      }
      None => {
        git.create_branch_at(&branches.stable, &staging_tip)?;
        chain.push_task(
          format!("create {}", branches.stable),
          GitAction::new(git, GitUndo::DeleteBranch {
            name: branches.stable.clone(),
          }),
        );
      }
    }
    println!("   🌿 '{}' now points at {}", branches.stable, tag);

    for story in &found {
      let undo = story.release()?;
      chain.push_task(format!("release story {}", story.readable_id()), undo);
    }

    git.push(&branches.remote, &[forced_refspec(&branches.stable)], true)?;
    chain.push(ReportAction::new(format!(
      "'{}' was already pushed to '{}'; reset it there by hand",
      branches.stable, branches.remote
    )));

    Ok((original, release_version))
  })?;

  return_to(ctx, &original);
  println!();
  println!("✅ Release {} deployed", release_version);
  Ok(())
}
