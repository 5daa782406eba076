//! `release cherry-pick`: bring stories that landed on trunk late onto the
//! release branch
//!
//! Commits are matched by Change-Id, never by SHA or content, so a change
//! already on the release branch under a different SHA is not picked again.
//! Only commits that trunk has seen are ever picked.

use super::{branch_refspec, release_branch, return_to, stories};
use crate::action::{ActionChain, GitAction, GitUndo, ReportAction};
use crate::changes::{CherryPickPlanner, StoryChangeGroup, group_by_story_id};
use crate::commits::Commit;
use crate::commits::source::SourceIndex;
use crate::core::context::WorkflowContext;
use crate::core::error::{FlowError, FlowResult};
use crate::core::vcs::BranchStatus;
use crate::ui::progress::PickProgress;

/// Release ref to reconcile against: the local branch, or its upstream when
/// there is no local copy. None when neither exists; an error when both
/// exist but differ.
pub fn release_target(ctx: &WorkflowContext) -> FlowResult<Option<String>> {
  let release = release_branch(ctx)?;
  Ok(match release.status() {
    BranchStatus::InSync | BranchStatus::LocalOnly => Some(release.local_name.clone()),
    BranchStatus::RemoteOnly => Some(release.remote_ref()),
    BranchStatus::Diverged | BranchStatus::Missing => None,
  })
}

/// Change groups of the given stories across trunk and release history,
/// with every commit attributed to the ref it belongs to
pub fn story_groups(ctx: &WorkflowContext, story_ids: &[String]) -> FlowResult<Vec<StoryChangeGroup>> {
  let branches = ctx.branches();
  let git = &ctx.git;

  let mut revisions = Vec::new();
  for name in branches.source_priority() {
    if git.ref_exists(&name)? {
      revisions.push(name);
    }
  }
  if revisions.is_empty() {
    return Err(FlowError::with_help(
      format!("Neither '{}' nor '{}' exists", branches.trunk, branches.release),
      "Check the [branches] section of trunkflow.toml.",
    ));
  }
  let stable_upstream = branches.upstream(&branches.stable);
  if git.ref_exists(&stable_upstream)? {
    revisions.push(format!("^{}", stable_upstream));
  }

  let revisions: Vec<&str> = revisions.iter().map(String::as_str).collect();
  let mut commits: Vec<Commit> = stories::tagged_commits(git, &revisions)?
    .into_iter()
    .filter(|c| c.story_id.as_ref().is_some_and(|id| story_ids.contains(id)))
    .collect();

  for id in story_ids {
    if !commits.iter().any(|c| c.story_id.as_ref() == Some(id)) {
      tracing::warn!(story = %id, "no commits found for story");
    }
  }

  SourceIndex::load(git, branches)?.attribute(&mut commits);
  Ok(group_by_story_id(commits))
}

fn print_plan(plan: &[StoryChangeGroup], picks: &[&Commit]) {
  for group in plan {
    println!("   {}", group.story_id);
    for change in &group.changes {
      println!("     • {} {}", change.change_id, change.title());
    }
  }
  println!();
  println!("   {} commit(s) to cherry-pick:", picks.len());
  for commit in picks {
    println!("     {} {}", commit.short_sha(), commit.title);
  }
}

pub fn run(ctx: &WorkflowContext, story_ids: &[String], dry_run: bool) -> FlowResult<()> {
  let branches = ctx.branches();
  let git = &ctx.git;

  println!("🍒 Cherry-picking {} onto '{}'", story_ids.join(", "), branches.release);

  let (original, picked) = ActionChain::run(|chain| {
    let original = if dry_run { None } else { Some(ctx.begin(chain)?) };
    ctx.fetch()?;

    let target = release_target(ctx)?.ok_or_else(|| {
      FlowError::with_help(
        format!("Release branch '{}' does not exist", branches.release),
        "Run 'trunkflow release start' first.",
      )
    })?;

    let groups = story_groups(ctx, story_ids)?;
    for id in story_ids {
      if !groups.iter().any(|group| group.story_id == *id) {
        println!("   ⚠️  No changes found for {}", id);
      }
    }
    let reachable = git.reachable_shas(&target)?;
    let planner = CherryPickPlanner::new(branches.trunk_refs());
    let plan = planner.plan(&groups, &reachable)?;
    let picks = planner.commits_to_pick(&plan);

    if picks.is_empty() {
      println!();
      println!("✅ '{}' already contains every change of these stories", branches.release);
      return Ok((original, 0));
    }
    print_plan(&plan, &picks);

    if dry_run {
      println!();
      println!("🔍 Dry-run mode (no changes applied)");
      return Ok((original, 0));
    }

    let release = git.branch_ref(&branches.release, &branches.remote)?;
    match release.local_hash.clone() {
      Some(previous_sha) => {
        git.checkout(&branches.release)?;
        chain.push_task(
          format!("cherry-pick onto {}", branches.release),
          GitAction::new(git, GitUndo::ResetBranch {
            name: branches.release.clone(),
            previous_sha,
          }),
        );
      }
      None => {
        git.create_branch_at(&branches.release, &target)?;
        chain.push_task(
          format!("create {}", branches.release),
          GitAction::new(git, GitUndo::DeleteBranch {
            name: branches.release.clone(),
          }),
        );
        git.checkout(&branches.release)?;
      }
    }

    let mut progress = PickProgress::new(picks.len(), &branches.release);
    for commit in &picks {
      if let Err(e) = git.cherry_pick(&commit.sha) {
        if let Err(abort) = git.cherry_pick_abort() {
          tracing::error!(sha = commit.short_sha(), error = %abort, "could not abort cherry-pick");
        }
        return Err(e);
      }
      progress.picked(commit);
    }

    git.push(&branches.remote, &[branch_refspec(&branches.release)], true)?;
    chain.push(ReportAction::new(format!(
      "'{}' was already pushed to '{}'; reset it there by hand",
      branches.release, branches.remote
    )));

    Ok((original, picks.len()))
  })?;

  if let Some(original) = original {
    return_to(ctx, &original);
  }
  if picked > 0 {
    println!();
    println!("✅ Cherry-picked {} commit(s) onto '{}'", picked, branches.release);
  }
  Ok(())
}
