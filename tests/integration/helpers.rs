//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A working clone on `develop` with a bare `origin` and a `stable` branch
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
  pub remote: PathBuf,
}

impl TestRepo {
  /// Create the repositories and run `trunkflow init`
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("work");
    let remote = root.path().join("remote.git");
    std::fs::create_dir_all(&path)?;

    git(root.path(), &["init", "--quiet", "--bare", "--initial-branch=develop", "remote.git"])?;

    git(&path, &["init", "--quiet", "--initial-branch=develop"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;
    git(&path, &["config", "tag.gpgsign", "false"])?;

    std::fs::write(
      path.join("Cargo.toml"),
      r#"[package]
name = "demo"
version = "1.0.0-dev"
edition = "2024"
"#,
    )?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "--quiet", "-m", "Initial commit"])?;

    let remote_url = remote.to_string_lossy().to_string();
    git(&path, &["remote", "add", "origin", &remote_url])?;
    git(&path, &["push", "--quiet", "origin", "develop"])?;
    git(&path, &["branch", "stable"])?;
    git(&path, &["push", "--quiet", "origin", "stable"])?;
    git(&path, &["fetch", "--quiet", "origin"])?;

    let repo = Self { _root: root, path, remote };
    run_trunkflow(&repo.path, &["init", "--force"])?;
    Ok(repo)
  }

  /// Replace the story file with `(id, state)` entries
  pub fn write_stories(&self, stories: &[(&str, &str)]) -> Result<()> {
    let mut content = String::new();
    for (id, state) in stories {
      content.push_str(&format!(
        "[[stories]]\nid = \"{}\"\ntitle = \"Story {}\"\nstate = \"{}\"\n\n",
        id, id, state
      ));
    }
    std::fs::write(self.path.join(".trunkflow/stories.toml"), content)?;
    Ok(())
  }

  /// State of a story as written in the story file
  pub fn story_state(&self, id: &str) -> Result<String> {
    let content = self.read_file(".trunkflow/stories.toml")?;
    let doc: toml_edit::DocumentMut = content.parse()?;
    let stories = doc
      .get("stories")
      .and_then(|item| item.as_array_of_tables())
      .context("no stories")?;
    let story = stories
      .iter()
      .find(|t| t.get("id").and_then(|v| v.as_str()) == Some(id))
      .context("story not found")?;
    Ok(story.get("state").and_then(|v| v.as_str()).unwrap_or("new").to_string())
  }

  /// Commit a new file tagged with a story and change id on the current branch
  pub fn commit_change(&self, story: &str, change: &str, title: &str) -> Result<String> {
    let file = format!("{}.txt", change.to_lowercase());
    std::fs::write(self.path.join(&file), format!("{}\n", title))?;
    git(&self.path, &["add", &file])?;
    let message = format!("{}\n\nStory-Id: {}\nChange-Id: {}\n", title, story, change);
    git(&self.path, &["commit", "--quiet", "-m", &message])?;
    self.rev_parse("HEAD")
  }

  /// Push the current state of a branch to origin
  pub fn push(&self, branch: &str) -> Result<()> {
    git(&self.path, &["push", "--quiet", "origin", branch])?;
    Ok(())
  }

  pub fn rev_parse(&self, rev: &str) -> Result<String> {
    let output = git(&self.path, &["rev-parse", rev])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Whether a ref exists in the working clone
  pub fn has_ref(&self, rev: &str) -> bool {
    git(&self.path, &["rev-parse", "--verify", "--quiet", rev]).is_ok()
  }

  /// Whether a ref exists in the bare remote
  pub fn remote_has_ref(&self, rev: &str) -> bool {
    git(&self.remote, &["rev-parse", "--verify", "--quiet", rev]).is_ok()
  }

  /// Resolve a ref in the bare remote
  pub fn remote_rev_parse(&self, rev: &str) -> Result<String> {
    let output = git(&self.remote, &["rev-parse", rev])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// A file's content at a revision of the bare remote
  pub fn remote_show(&self, rev: &str, path: &str) -> Result<String> {
    let output = git(&self.remote, &["show", &format!("{}:{}", rev, path)])?;
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }

  /// Subject lines reachable from a remote ref, newest first
  pub fn remote_subjects(&self, rev: &str) -> Result<Vec<String>> {
    let output = git(&self.remote, &["log", "--format=%s", rev])?;
    Ok(String::from_utf8_lossy(&output.stdout).lines().map(String::from).collect())
  }

  pub fn current_branch(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run trunkflow and require success
pub fn run_trunkflow(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = trunkflow(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "trunkflow command failed: trunkflow {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run trunkflow and return its output whatever the exit status
pub fn trunkflow(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_trunkflow"))
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run trunkflow")
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

/// Install an executable hook script into a git directory
pub fn install_hook(git_dir: &Path, name: &str, script: &str) -> Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let hooks = git_dir.join("hooks");
  std::fs::create_dir_all(&hooks)?;
  let path = hooks.join(name);
  std::fs::write(&path, script)?;
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
  Ok(())
}

/// Hook that rejects every push
pub const REJECT_PUSH_HOOK: &str = "#!/bin/sh\necho 'pushes are frozen' >&2\nexit 1\n";
