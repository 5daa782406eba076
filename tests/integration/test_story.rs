//! Tests for `story start`, `story finish` and `story changes`

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_story_start_and_finish() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_stories(&[("S-3", "new")])?;

  run_trunkflow(&repo.path, &["story", "start", "S-3"])?;
  assert_eq!(repo.current_branch()?, "story/S-3");
  assert!(repo.remote_has_ref("refs/heads/story/S-3"));
  assert_eq!(repo.story_state("S-3")?, "started");

  // a story can only be started once
  let again = trunkflow(&repo.path, &["story", "start", "S-3"])?;
  assert_eq!(again.status.code(), Some(3));

  run_trunkflow(&repo.path, &["story", "finish", "S-3"])?;
  assert_eq!(repo.story_state("S-3")?, "implemented");

  let again = trunkflow(&repo.path, &["story", "finish", "S-3"])?;
  assert_eq!(again.status.code(), Some(3));
  assert_eq!(repo.story_state("S-3")?, "implemented");

  Ok(())
}

#[test]
fn test_story_start_unknown_story_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_stories(&[("S-3", "new")])?;

  let output = trunkflow(&repo.path, &["story", "start", "S-9"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(!repo.has_ref("refs/heads/story/S-9"));

  Ok(())
}

#[test]
fn test_story_start_rolls_back_when_push_is_rejected() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_stories(&[("S-4", "new")])?;

  // someone else already pushed an unrelated story/S-4
  git(&repo.path, &["checkout", "--quiet", "-b", "elsewhere"])?;
  std::fs::write(repo.path.join("elsewhere.txt"), "elsewhere\n")?;
  git(&repo.path, &["add", "elsewhere.txt"])?;
  git(&repo.path, &["commit", "--quiet", "-m", "Unrelated work"])?;
  git(&repo.path, &["push", "--quiet", "origin", "elsewhere:refs/heads/story/S-4"])?;
  git(&repo.path, &["checkout", "--quiet", "develop"])?;
  git(&repo.path, &["branch", "--quiet", "-D", "elsewhere"])?;

  let output = trunkflow(&repo.path, &["story", "start", "S-4"])?;
  assert_eq!(output.status.code(), Some(2));

  assert_eq!(repo.story_state("S-4")?, "new");
  assert!(!repo.has_ref("refs/heads/story/S-4"));
  assert_eq!(repo.current_branch()?, "develop");
  assert_eq!(repo.remote_subjects("refs/heads/story/S-4")?[0], "Unrelated work");

  Ok(())
}

#[test]
fn test_story_changes_reports_release_presence() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_stories(&[("S-1", "implemented")])?;
  repo.commit_change("S-1", "I100", "Add invoice export")?;
  repo.push("develop")?;
  run_trunkflow(&repo.path, &["release", "start"])?;
  repo.commit_change("S-1", "I101", "Export credit notes too")?;
  repo.push("develop")?;

  let output = run_trunkflow(&repo.path, &["story", "changes", "S-1", "--json"])?;
  let reports: serde_json::Value = serde_json::from_str(&stdout(&output))?;

  assert_eq!(reports[0]["story_id"], "S-1");
  let changes = reports[0]["changes"].as_array().cloned().unwrap_or_default();
  assert_eq!(changes.len(), 2);

  let on_release = |change_id: &str| {
    changes
      .iter()
      .find(|change| change["change_id"] == change_id)
      .map(|change| change["on_release"].clone())
  };
  assert_eq!(on_release("I100"), Some(serde_json::Value::Bool(true)));
  assert_eq!(on_release("I101"), Some(serde_json::Value::Bool(false)));

  Ok(())
}

#[test]
fn test_story_start_keeps_pushed_branch_when_checkout_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_stories(&[("S-5", "new")])?;
  install_hook(
    &repo.path.join(".git"),
    "post-checkout",
    "#!/bin/sh\ncase \"$(git rev-parse --abbrev-ref HEAD)\" in story/*) exit 1 ;; esac\nexit 0\n",
  )?;

  let output = trunkflow(&repo.path, &["story", "start", "S-5"])?;
  assert!(output.status.success());

  assert!(repo.has_ref("refs/heads/story/S-5"));
  assert!(repo.remote_has_ref("refs/heads/story/S-5"));
  assert_eq!(repo.story_state("S-5")?, "started");

  Ok(())
}
