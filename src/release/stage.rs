//! `release stage`: promote the release branch to staging
//!
//! Steps, each registering its compensation before the next one runs:
//!
//! 1. fetch and check that the upstream release branch exists and matches
//!    the local one
//! 2. require every story in the release to be implemented
//! 3. reset staging to the release tip
//! 4. delete the local release branch
//! 5. commit the final version on staging and tag it
//! 6. move the stories to staged and finalise the release in code review
//! 7. push staging and the tag, delete the upstream release branch

use super::{forced_refspec, release_branch, require_ref, return_to, stories, version};
use crate::action::{ActionChain, GitAction, GitUndo, ReportAction};
use crate::core::context::WorkflowContext;
use crate::core::error::{FlowError, FlowResult};
use crate::tracker::StoryState;

pub fn run(ctx: &WorkflowContext) -> FlowResult<()> {
  let branches = ctx.branches();
  let git = &ctx.git;

  println!("📦 Staging release branch '{}'", branches.release);

  let (original, release_version) = ActionChain::run(|chain| {
    let original = ctx.begin(chain)?;
    ctx.fetch()?;

    let release_upstream = branches.upstream(&branches.release);
    let release_tip = require_ref(ctx, &release_upstream, "Run 'trunkflow release start' first.")?;
    release_branch(ctx)?;

    let release_version = version::release_version(&version::version_at(git, &ctx.config.version, &release_upstream)?);
    let tag = version::tag_name(&release_version);
    if git.tag_exists(&tag)? {
      return Err(FlowError::with_help(
        format!("Tag '{}' already exists", tag),
        "Each version can be staged once; start a new release instead.",
      ));
    }
    println!("   Release version: {}", release_version);

    let range = stories::range(git, &branches.upstream(&branches.stable), &release_upstream)?;
    let tracker = ctx.tracker();
    let (ids, found) = stories::stories_in_range(git, tracker.as_ref(), &range)?;
    stories::require_states(&ids, &found, "implemented", |state| state >= StoryState::Implemented)?;
    stories::print_stories(&found);

    let staging_ref = format!("refs/heads/{}", branches.staging);
    match git.rev_parse(&staging_ref)? {
      Some(previous_sha) => {
        git.reset_branch(&branches.staging, &release_tip)?;
        chain.push_task(
          format!("reset {}", branches.staging),
          GitAction::new(git, GitUndo::ResetBranch {
            name: branches.staging.clone(),
            previous_sha,
          }),
        );
      }
      None => {
        git.create_branch_at(&branches.staging, &release_tip)?;
        chain.push_task(
          format!("create {}", branches.staging),
          GitAction::new(git, GitUndo::DeleteBranch {
            name: branches.staging.clone(),
          }),
        );
      }
    }
    git.checkout(&branches.staging)?;
    println!("   🌿 '{}' now points at '{}'", branches.staging, release_upstream);

    if let Some(sha) = git.rev_parse(&format!("refs/heads/{}", branches.release))? {
      git.delete_branch(&branches.release)?;
      chain.push_task(
        format!("delete {}", branches.release),
        GitAction::new(git, GitUndo::RestoreBranch {
          name: branches.release.clone(),
          sha,
        }),
      );
      println!("   🗑️  Deleted local '{}'", branches.release);
    }

    let before_bump = git.head_commit()?;
    version::commit_version(git, &ctx.config.version, &release_version)?;
    chain.push_task(
      format!("commit version {}", release_version),
      GitAction::new(git, GitUndo::ResetBranch {
        name: branches.staging.clone(),
        previous_sha: before_bump,
      }),
    );

    git.create_tag(&tag, "HEAD", &format!("Release {}", release_version))?;
    chain.push_task(
      format!("tag {}", tag),
      GitAction::new(git, GitUndo::DeleteTag { name: tag.clone() }),
    );
    println!("   🔖 Tagged {}", tag);

    for story in &found {
      let undo = story.stage()?;
      chain.push_task(format!("stage story {}", story.readable_id()), undo);
    }

    let undo = ctx.review().finalise_release(&release_version.to_string())?;
    chain.push_task(format!("finalise release {}", release_version), undo);

    let refspecs = [
      forced_refspec(&branches.staging),
      format!(":refs/heads/{}", branches.release),
      format!("refs/tags/{0}:refs/tags/{0}", tag),
    ];
    git.push(&branches.remote, &refspecs, true)?;
    chain.push(ReportAction::new(format!(
      "'{}' and tag '{}' were pushed and '{}' was deleted on '{}'; restore them there by hand",
      branches.staging, tag, branches.release, branches.remote
    )));

    Ok((original, release_version))
  })?;

  return_to(ctx, &original);
  println!();
  println!("✅ Release {} staged", release_version);
  Ok(())
}
