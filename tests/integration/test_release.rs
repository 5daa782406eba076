//! Tests for `release start`, `release stage` and `release deploy`

use crate::helpers::*;
use anyhow::Result;

/// A repo with one implemented story on trunk, pushed to origin
fn repo_with_story(state: &str) -> Result<TestRepo> {
  let repo = TestRepo::new()?;
  repo.write_stories(&[("S-1", state)])?;
  repo.commit_change("S-1", "I100", "Add invoice export")?;
  repo.push("develop")?;
  Ok(repo)
}

#[test]
fn test_release_start_cuts_branch_and_bumps_trunk() -> Result<()> {
  let repo = repo_with_story("implemented")?;

  let output = run_trunkflow(&repo.path, &["release", "start"])?;
  assert!(stdout(&output).contains("Release 1.0.0 started"));

  assert!(repo.remote_show("refs/heads/release", "Cargo.toml")?.contains(r#"version = "1.0.0-dev""#));
  assert!(repo.remote_show("refs/heads/develop", "Cargo.toml")?.contains(r#"version = "1.1.0-dev""#));
  assert!(repo.remote_subjects("refs/heads/release")?.contains(&"Add invoice export".to_string()));
  assert_eq!(repo.current_branch()?, "develop");
  assert_eq!(repo.rev_parse("develop")?, repo.remote_rev_parse("refs/heads/develop")?);

  // only one release can be in flight
  let second = trunkflow(&repo.path, &["release", "start"])?;
  assert_eq!(second.status.code(), Some(1));
  assert!(repo.remote_show("refs/heads/develop", "Cargo.toml")?.contains(r#"version = "1.1.0-dev""#));

  Ok(())
}

#[test]
fn test_release_start_refuses_unpushed_trunk() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_stories(&[("S-1", "implemented")])?;
  repo.commit_change("S-1", "I100", "Add invoice export")?;

  let output = trunkflow(&repo.path, &["release", "start"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(!repo.has_ref("refs/heads/release"));
  assert!(!repo.remote_has_ref("refs/heads/release"));

  Ok(())
}

#[test]
fn test_release_stage_rolls_back_on_unfinished_story() -> Result<()> {
  let repo = repo_with_story("started")?;
  run_trunkflow(&repo.path, &["release", "start"])?;
  let release_sha = repo.rev_parse("refs/heads/release")?;

  let output = trunkflow(&repo.path, &["release", "stage"])?;
  assert_eq!(output.status.code(), Some(3));

  assert_eq!(repo.rev_parse("refs/heads/release")?, release_sha);
  assert!(!repo.has_ref("refs/heads/stage"));
  assert!(!repo.has_ref("refs/tags/v1.0.0"));
  assert!(!repo.remote_has_ref("refs/heads/stage"));
  assert!(repo.remote_has_ref("refs/heads/release"));
  assert_eq!(repo.story_state("S-1")?, "started");
  assert_eq!(repo.current_branch()?, "develop");

  Ok(())
}

#[test]
fn test_release_stage_and_deploy() -> Result<()> {
  let repo = repo_with_story("implemented")?;
  run_trunkflow(&repo.path, &["release", "start"])?;

  let output = run_trunkflow(&repo.path, &["release", "stage"])?;
  assert!(stdout(&output).contains("Release 1.0.0 staged"));

  assert!(repo.remote_has_ref("refs/heads/stage"));
  assert!(repo.remote_has_ref("refs/tags/v1.0.0"));
  assert!(!repo.remote_has_ref("refs/heads/release"));
  assert!(!repo.has_ref("refs/heads/release"));
  assert!(repo.remote_show("refs/heads/stage", "Cargo.toml")?.contains(r#"version = "1.0.0""#));
  assert_eq!(repo.story_state("S-1")?, "staged");
  assert_eq!(repo.current_branch()?, "develop");

  let output = run_trunkflow(&repo.path, &["release", "deploy"])?;
  assert!(stdout(&output).contains("Release 1.0.0 deployed"));

  assert_eq!(
    repo.remote_rev_parse("refs/heads/stable")?,
    repo.remote_rev_parse("refs/heads/stage")?
  );
  assert_eq!(repo.story_state("S-1")?, "released");

  Ok(())
}

#[test]
fn test_release_deploy_without_staged_release_fails() -> Result<()> {
  let repo = repo_with_story("implemented")?;

  let output = trunkflow(&repo.path, &["release", "deploy"])?;
  assert_eq!(output.status.code(), Some(1));
  assert_eq!(repo.story_state("S-1")?, "implemented");

  Ok(())
}

#[test]
fn test_release_stage_refuses_unpushed_release_commits() -> Result<()> {
  let repo = repo_with_story("implemented")?;
  run_trunkflow(&repo.path, &["release", "start"])?;

  git(&repo.path, &["checkout", "--quiet", "release"])?;
  std::fs::write(repo.path.join("hotfix.txt"), "hotfix\n")?;
  git(&repo.path, &["add", "hotfix.txt"])?;
  git(&repo.path, &["commit", "--quiet", "-m", "Local hotfix"])?;
  let local_release = repo.rev_parse("refs/heads/release")?;
  git(&repo.path, &["checkout", "--quiet", "develop"])?;

  let output = trunkflow(&repo.path, &["release", "stage"])?;
  assert_eq!(output.status.code(), Some(1));

  assert_eq!(repo.rev_parse("refs/heads/release")?, local_release);
  assert!(!repo.has_ref("refs/heads/stage"));
  assert!(!repo.remote_has_ref("refs/heads/stage"));
  assert_eq!(repo.story_state("S-1")?, "implemented");

  Ok(())
}

#[test]
fn test_release_stage_rolls_back_when_push_is_rejected() -> Result<()> {
  let repo = repo_with_story("implemented")?;
  run_trunkflow(&repo.path, &["release", "start"])?;
  let release_sha = repo.rev_parse("refs/heads/release")?;
  install_hook(&repo.remote, "pre-receive", REJECT_PUSH_HOOK)?;

  let output = trunkflow(&repo.path, &["release", "stage"])?;
  assert_eq!(output.status.code(), Some(2));

  // every local step is unwound
  assert_eq!(repo.rev_parse("refs/heads/release")?, release_sha);
  assert!(!repo.has_ref("refs/heads/stage"));
  assert!(!repo.has_ref("refs/tags/v1.0.0"));
  assert_eq!(repo.story_state("S-1")?, "implemented");
  assert_eq!(repo.current_branch()?, "develop");

  // and the remote never saw any of it
  assert_eq!(repo.remote_rev_parse("refs/heads/release")?, release_sha);
  assert!(!repo.remote_has_ref("refs/heads/stage"));
  assert!(!repo.remote_has_ref("refs/tags/v1.0.0"));

  Ok(())
}

#[test]
fn test_release_stage_keeps_pushed_state_when_switching_back_fails() -> Result<()> {
  let repo = repo_with_story("implemented")?;
  run_trunkflow(&repo.path, &["release", "start"])?;
  install_hook(
    &repo.path.join(".git"),
    "post-checkout",
    "#!/bin/sh\n[ \"$(git rev-parse --abbrev-ref HEAD)\" = develop ] && exit 1\nexit 0\n",
  )?;

  let output = trunkflow(&repo.path, &["release", "stage"])?;
  assert!(output.status.success());
  assert!(stdout(&output).contains("Could not switch back"));

  assert!(repo.remote_has_ref("refs/heads/stage"));
  assert!(repo.remote_has_ref("refs/tags/v1.0.0"));
  assert!(!repo.remote_has_ref("refs/heads/release"));
  assert!(repo.has_ref("refs/tags/v1.0.0"));
  assert!(!repo.has_ref("refs/heads/release"));
  assert_eq!(repo.story_state("S-1")?, "staged");

  Ok(())
}
