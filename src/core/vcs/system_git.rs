//! System git backend
//!
//! Every operation is a single `git` subprocess with an isolated environment.
//! Output is captured and failures are mapped to `GitError` with the command
//! line and stderr, so the operator sees exactly what git refused.

use crate::core::error::{FlowError, FlowResult, GitError, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Git backend using system git
#[derive(Debug, Clone)]
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  pub fn open(path: &Path) -> FlowResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(FlowError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(FlowError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Root of the working tree
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> FlowResult<String> {
    self.run(&["rev-parse", "HEAD"])
  }

  /// Get current branch name ("HEAD" when detached)
  pub fn current_branch(&self) -> FlowResult<String> {
    let output = self
      .git_cmd()
      .args(["rev-parse", "--abbrev-ref", "HEAD"])
      .output()
      .context("Failed to get current branch")?;

    if !output.status.success() {
      return Ok("HEAD".to_string());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Run git and return trimmed stdout, failing on a non-zero exit
  pub(crate) fn run(&self, args: &[&str]) -> FlowResult<String> {
    let output = self.output(args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Run git and return the raw output, failing on a non-zero exit
  pub(crate) fn output(&self, args: &[&str]) -> FlowResult<Output> {
    tracing::debug!(command = %format!("git {}", args.join(" ")), "running git");
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
      return Err(FlowError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(output)
  }

  /// Run git and report only whether it exited successfully
  pub(crate) fn succeeds(&self, args: &[&str]) -> FlowResult<bool> {
    let status = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?
      .status;
    Ok(status.success())
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false");
    cmd.arg("-c").arg("color.ui=false");
    cmd.arg("-c").arg("log.showSignature=false");

    cmd
  }
}

/// Validate a full object name: 40 hex chars (SHA-1) or 64 (SHA-256)
pub fn is_valid_sha(sha: &str) -> bool {
  matches!(sha.len(), 40 | 64) && sha.chars().all(|c| c.is_ascii_hexdigit())
}
