//! Tests for `release cherry-pick`

use crate::helpers::*;
use anyhow::Result;

/// Release started with S-1; S-2 lands on trunk afterwards
fn repo_with_late_story() -> Result<TestRepo> {
  let repo = TestRepo::new()?;
  repo.write_stories(&[("S-1", "implemented"), ("S-2", "implemented")])?;
  repo.commit_change("S-1", "I100", "Add invoice export")?;
  repo.push("develop")?;
  run_trunkflow(&repo.path, &["release", "start"])?;

  repo.commit_change("S-2", "I200", "Fix rounding in totals")?;
  repo.push("develop")?;
  Ok(repo)
}

#[test]
fn test_cherry_pick_dry_run_changes_nothing() -> Result<()> {
  let repo = repo_with_late_story()?;
  let before = repo.remote_rev_parse("refs/heads/release")?;

  let output = run_trunkflow(&repo.path, &["release", "cherry-pick", "S-2", "--dry-run"])?;
  let out = stdout(&output);
  assert!(out.contains("Dry-run"));
  assert!(out.contains("I200"));

  assert_eq!(repo.remote_rev_parse("refs/heads/release")?, before);
  assert_eq!(repo.current_branch()?, "develop");

  Ok(())
}

#[test]
fn test_cherry_pick_brings_story_onto_release_once() -> Result<()> {
  let repo = repo_with_late_story()?;

  let output = run_trunkflow(&repo.path, &["release", "cherry-pick", "S-2"])?;
  assert!(stdout(&output).contains("Cherry-picked 1 commit(s)"));

  let subjects = repo.remote_subjects("refs/heads/release")?;
  assert!(subjects.contains(&"Fix rounding in totals".to_string()));
  assert_eq!(repo.current_branch()?, "develop");
  assert_eq!(repo.rev_parse("refs/heads/release")?, repo.remote_rev_parse("refs/heads/release")?);

  // the copy on release carries the same Change-Id, so nothing is left to pick
  let output = run_trunkflow(&repo.path, &["release", "cherry-pick", "S-2"])?;
  assert!(stdout(&output).contains("already contains"));
  assert_eq!(repo.remote_subjects("refs/heads/release")?, subjects);

  Ok(())
}

#[test]
fn test_cherry_pick_skips_changes_already_on_release() -> Result<()> {
  let repo = repo_with_late_story()?;
  let before = repo.remote_rev_parse("refs/heads/release")?;

  let output = run_trunkflow(&repo.path, &["release", "cherry-pick", "S-1"])?;
  assert!(stdout(&output).contains("already contains"));
  assert_eq!(repo.remote_rev_parse("refs/heads/release")?, before);

  Ok(())
}

#[test]
fn test_cherry_pick_without_release_branch_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_stories(&[("S-2", "implemented")])?;
  repo.commit_change("S-2", "I200", "Fix rounding in totals")?;
  repo.push("develop")?;

  let output = trunkflow(&repo.path, &["release", "cherry-pick", "S-2"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(!repo.remote_has_ref("refs/heads/release"));
  assert_eq!(repo.current_branch()?, "develop");

  Ok(())
}

#[test]
fn test_cherry_pick_refuses_stale_local_release() -> Result<()> {
  let repo = repo_with_late_story()?;
  let before = repo.rev_parse("refs/heads/release")?;
  run_trunkflow(&repo.path, &["release", "cherry-pick", "S-2"])?;
  let after = repo.remote_rev_parse("refs/heads/release")?;

  // local release falls behind origin/release
  git(&repo.path, &["branch", "--force", "release", &before])?;

  let output = trunkflow(&repo.path, &["release", "cherry-pick", "S-2", "--dry-run"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(!stdout(&output).contains("commit(s) to cherry-pick"));

  let output = trunkflow(&repo.path, &["story", "changes", "S-2"])?;
  assert_eq!(output.status.code(), Some(1));

  assert_eq!(repo.remote_rev_parse("refs/heads/release")?, after);
  assert_eq!(repo.rev_parse("refs/heads/release")?, before);

  Ok(())
}

#[test]
fn test_cherry_pick_conflict_resets_release() -> Result<()> {
  let repo = repo_with_late_story()?;

  // release already has its own version of the file I200 adds
  git(&repo.path, &["checkout", "--quiet", "release"])?;
  std::fs::write(repo.path.join("i200.txt"), "release side\n")?;
  git(&repo.path, &["add", "i200.txt"])?;
  git(&repo.path, &["commit", "--quiet", "-m", "Conflicting work"])?;
  repo.push("release")?;
  git(&repo.path, &["checkout", "--quiet", "develop"])?;
  let release_sha = repo.rev_parse("refs/heads/release")?;

  let output = trunkflow(&repo.path, &["release", "cherry-pick", "S-2"])?;
  assert_eq!(output.status.code(), Some(2));

  assert_eq!(repo.rev_parse("refs/heads/release")?, release_sha);
  assert_eq!(repo.remote_rev_parse("refs/heads/release")?, release_sha);
  assert_eq!(repo.current_branch()?, "develop");
  assert!(!repo.has_ref("CHERRY_PICK_HEAD"));
  let status = git(&repo.path, &["status", "--porcelain", "--untracked-files=no"])?;
  assert!(stdout(&status).trim().is_empty());

  Ok(())
}
