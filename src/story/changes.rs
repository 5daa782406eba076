//! `story changes`: what each story consists of and what the release has

use crate::changes::{Change, CherryPickPlanner};
use crate::core::context::WorkflowContext;
use crate::core::error::FlowResult;
use crate::release::cherry_pick::{release_target, story_groups};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Serialize)]
struct StoryReport<'a> {
  story_id: &'a str,
  changes: Vec<ChangeReport<'a>>,
}

#[derive(Serialize)]
struct ChangeReport<'a> {
  #[serde(flatten)]
  change: &'a Change,
  on_release: bool,
}

pub fn run(ctx: &WorkflowContext, story_ids: &[String], json: bool) -> FlowResult<()> {
  let groups = story_groups(ctx, story_ids)?;
  let target = release_target(ctx)?;
  let reachable = match &target {
    Some(target) => ctx.git.reachable_shas(target)?,
    None => HashSet::new(),
  };

  let reports: Vec<StoryReport> = CherryPickPlanner::presence(&groups, &reachable)
    .into_iter()
    .map(|presence| {
      let mut changes: Vec<ChangeReport> = presence
        .present
        .into_iter()
        .map(|change| ChangeReport {
          change,
          on_release: true,
        })
        .chain(presence.missing.into_iter().map(|change| ChangeReport {
          change,
          on_release: false,
        }))
        .collect();
      changes.sort_by_key(|report| report.change.earliest_date());
      StoryReport {
        story_id: presence.story_id,
        changes,
      }
    })
    .collect();

  if json {
    println!("{}", serde_json::to_string_pretty(&reports)?);
    return Ok(());
  }

  if reports.is_empty() {
    println!("⚠️  No changes found for {}", story_ids.join(", "));
    return Ok(());
  }

  match &target {
    Some(target) => println!("📋 Changes (✅ = on '{}')", target),
    None => println!("📋 Changes (no release branch)"),
  }
  for report in &reports {
    println!();
    println!("  {}", report.story_id);
    for entry in &report.changes {
      let marker = if entry.on_release { "✅" } else { "⏳" };
      println!("    {} {} {}", marker, entry.change.change_id, entry.change.title());
      for commit in &entry.change.commits {
        println!("         {} {:<16} {}", commit.short_sha(), commit.source, commit.commit_date);
      }
    }
  }
  Ok(())
}
