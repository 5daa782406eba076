//! Tests for the `init` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_init_creates_config_and_story_file() -> Result<()> {
  let repo = TestRepo::new()?;

  assert!(repo.file_exists("trunkflow.toml"));
  let config = repo.read_file("trunkflow.toml")?;
  assert!(config.contains("[branches]"));
  assert!(config.contains(r#"trunk = "develop""#));
  assert!(config.contains("[version]"));

  assert!(repo.file_exists(".trunkflow/stories.toml"));
  assert_eq!(repo.read_file(".trunkflow/.gitignore")?, "*\n");

  // scaffolding must not dirty the working tree
  let status = git(&repo.path, &["status", "--porcelain"])?;
  assert!(stdout(&status).trim().lines().all(|line| line.contains("trunkflow.toml")));

  Ok(())
}

#[test]
fn test_init_keeps_existing_config_without_confirmation() -> Result<()> {
  let repo = TestRepo::new()?;
  std::fs::write(repo.path.join("trunkflow.toml"), "[branches]\ntrunk = \"develop\"\nstaging = \"qa\"\n")?;

  // stdin is closed, so the overwrite prompt reads no answer
  let output = run_trunkflow(&repo.path, &["init"])?;
  assert!(stdout(&output).contains("Aborted."));
  assert!(repo.read_file("trunkflow.toml")?.contains(r#"staging = "qa""#));

  Ok(())
}

#[test]
fn test_init_outside_repository_fails() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  let output = trunkflow(temp.path(), &["init"])?;
  assert!(!output.status.success());
  Ok(())
}

#[test]
fn test_commands_require_config() -> Result<()> {
  let repo = TestRepo::new()?;
  std::fs::remove_file(repo.path.join("trunkflow.toml"))?;

  let output = trunkflow(&repo.path, &["release", "start"])?;
  assert_eq!(output.status.code(), Some(1));
  Ok(())
}
