//! `release start`: cut a release branch from trunk
//!
//! The release branch keeps trunk's `X.Y.Z-dev` version; trunk moves on to
//! `X.(Y+1).0-dev`.

use super::{branch_refspec, return_to, stories, version};
use crate::action::{ActionChain, GitAction, GitUndo, ReportAction};
use crate::core::context::WorkflowContext;
use crate::core::error::{FlowError, FlowResult};
use crate::tracker::StoryState;

pub fn run(ctx: &WorkflowContext) -> FlowResult<()> {
  let branches = ctx.branches();
  let git = &ctx.git;

  println!("🚀 Starting a release from '{}'", branches.trunk);

  let (original, release_version) = ActionChain::run(|chain| {
    let original = ctx.begin(chain)?;
    ctx.fetch()?;

    let trunk = git.branch_ref(&branches.trunk, &branches.remote)?;
    if !trunk.is_synchronized() {
      return Err(FlowError::with_help(
        format!(
          "Trunk '{}' is not in sync with '{}' ({:?})",
          trunk.local_name,
          trunk.remote_ref(),
          trunk.status()
        ),
        format!("Pull or push '{}' so both sides point at the same commit.", branches.trunk),
      ));
    }
    let trunk_head = trunk.local_hash.clone().unwrap_or_default();

    let release = git.branch_ref(&branches.release, &branches.remote)?;
    if release.exists() {
      return Err(FlowError::with_help(
        format!("Release branch '{}' already exists", branches.release),
        "Stage or delete the current release before starting a new one.",
      ));
    }

    let current = version::version_at(git, &ctx.config.version, &branches.trunk)?;
    let release_version = version::release_version(&current);
    println!("   Version on trunk: {}", current);

    git.create_branch_at(&branches.release, &branches.trunk)?;
    chain.push_task(
      format!("create branch {}", branches.release),
      GitAction::new(git, GitUndo::DeleteBranch {
        name: branches.release.clone(),
      }),
    );
    println!("   🌿 Created '{}' for release {}", branches.release, release_version);

    let range = stories::range(git, &branches.upstream(&branches.stable), &branches.trunk)?;
    let tracker = ctx.tracker();
    let (ids, found) = stories::stories_in_range(git, tracker.as_ref(), &range)?;
    println!("   {} story(ies) in this release", ids.len());
    stories::print_stories(&found);
    for id in &ids {
      match found.iter().find(|s| s.readable_id() == id.as_str()) {
        Some(story) if story.state() >= StoryState::Implemented => {}
        Some(story) => {
          tracing::warn!(story = %id, state = %story.state(), "story is not implemented yet");
          println!("   ⚠️  {} is still {}", id, story.state());
        }
        None => {
          tracing::warn!(story = %id, "story is unknown to the issue tracker");
          println!("   ⚠️  {} is unknown to the issue tracker", id);
        }
      }
    }

    git.checkout(&branches.trunk)?;
    let next = version::next_dev_version(&current);
    version::commit_version(git, &ctx.config.version, &next)?;
    chain.push_task(
      format!("bump {} to {}", branches.trunk, next),
      GitAction::new(git, GitUndo::ResetBranch {
        name: branches.trunk.clone(),
        previous_sha: trunk_head,
      }),
    );
    println!("   🔖 Bumped '{}' to {}", branches.trunk, next);

    git.push(
      &branches.remote,
      &[branch_refspec(&branches.trunk), branch_refspec(&branches.release)],
      true,
    )?;
    chain.push(ReportAction::new(format!(
      "'{}' and '{}' were already pushed to '{}'; reset them there by hand",
      branches.trunk, branches.release, branches.remote
    )));

    Ok((original, release_version))
  })?;

  return_to(ctx, &original);
  println!();
  println!("✅ Release {} started", release_version);
  Ok(())
}
