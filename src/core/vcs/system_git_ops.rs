//! Branch, tag, log and remote operations for SystemGit

use super::system_git::{SystemGit, is_valid_sha};
use super::BranchRef;
use crate::core::error::{FlowError, FlowResult, GitError, ResultExt};
use std::collections::HashSet;
use std::path::Path;

/// Formatting flags every log/show invocation uses; the commit parser
/// depends on exactly this layout.
const LOG_FORMAT_ARGS: [&str; 5] = [
  "--source",
  "--pretty=fuller",
  "--date=iso-strict",
  "--no-decorate",
  "--no-color",
];

impl SystemGit {
  /// Resolve a ref to a commit SHA, None if it does not exist
  pub fn rev_parse(&self, rev: &str) -> FlowResult<Option<String>> {
    let spec = format!("{}^{{commit}}", rev);
    let output = self
      .git_cmd()
      .args(["rev-parse", "--verify", "--quiet", &spec])
      .output()
      .context("Failed to run git rev-parse")?;

    if !output.status.success() {
      return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
  }

  /// Check whether a ref resolves to a commit
  pub fn ref_exists(&self, rev: &str) -> FlowResult<bool> {
    Ok(self.rev_parse(rev)?.is_some())
  }

  /// Fetch from remote, pruning deleted branches
  pub fn fetch(&self, remote: &str) -> FlowResult<()> {
    println!("   Fetching from remote '{}'...", remote);
    self.run(&["fetch", "--quiet", "--prune", remote])?;
    Ok(())
  }

  /// Describe a local branch and its remote counterpart
  pub fn branch_ref(&self, branch: &str, remote: &str) -> FlowResult<BranchRef> {
    let local_hash = self.rev_parse(&format!("refs/heads/{}", branch))?;
    let remote_hash = self.rev_parse(&format!("refs/remotes/{}/{}", remote, branch))?;
    Ok(BranchRef {
      local_name: branch.to_string(),
      remote_name: remote.to_string(),
      remote_branch_name: branch.to_string(),
      local_hash,
      remote_hash,
    })
  }

  /// Fail unless the working tree has no uncommitted changes
  pub fn ensure_clean_work_tree(&self) -> FlowResult<()> {
    let status = self.run(&["status", "--porcelain", "--untracked-files=no"])?;
    if !status.is_empty() {
      return Err(FlowError::Git(GitError::DirtyWorkTree));
    }
    Ok(())
  }

  /// Create a branch pointing at `start`
  pub fn create_branch_at(&self, name: &str, start: &str) -> FlowResult<()> {
    self.run(&["branch", "--no-track", name, start])?;
    Ok(())
  }

  /// Point a branch at `sha`, whether or not it is checked out
  pub fn reset_branch(&self, name: &str, sha: &str) -> FlowResult<()> {
    if self.current_branch()? == name {
      self.run(&["reset", "--keep", sha])?;
    } else {
      self.run(&["branch", "--force", "--no-track", name, sha])?;
    }
    Ok(())
  }

  /// Delete a local branch regardless of merge status
  pub fn delete_branch(&self, name: &str) -> FlowResult<()> {
    if self.current_branch()? == name {
      return Err(FlowError::Git(GitError::BranchError {
        message: format!("cannot delete '{}' while it is checked out", name),
      }));
    }
    self.run(&["branch", "-D", name])?;
    Ok(())
  }

  /// Checkout a branch
  pub fn checkout(&self, branch: &str) -> FlowResult<()> {
    self.run(&["checkout", "--quiet", branch])?;
    Ok(())
  }

  /// Detach HEAD at the current commit
  pub fn detach_head(&self) -> FlowResult<()> {
    self.run(&["checkout", "--quiet", "--detach"])?;
    Ok(())
  }

  /// Create an annotated tag at `target`
  pub fn create_tag(&self, name: &str, target: &str, message: &str) -> FlowResult<()> {
    self.run(&["tag", "-a", name, "-m", message, target])?;
    Ok(())
  }

  pub fn delete_tag(&self, name: &str) -> FlowResult<()> {
    self.run(&["tag", "-d", name])?;
    Ok(())
  }

  pub fn tag_exists(&self, name: &str) -> FlowResult<bool> {
    self.succeeds(&["rev-parse", "--verify", "--quiet", &format!("refs/tags/{}", name)])
  }

  /// Stage `path` and commit it on the current branch, returning the new SHA
  pub fn commit_file(&self, path: &Path, message: &str) -> FlowResult<String> {
    let path = path.to_string_lossy();
    self.run(&["add", "--", &path])?;
    self.run(&["commit", "--quiet", "-m", message, "--", &path])?;
    self.head_commit()
  }

  /// Read a file at a revision, None if it does not exist there
  pub fn show_file(&self, rev: &str, path: &Path) -> FlowResult<Option<String>> {
    let spec = format!("{}:{}", rev, path.to_string_lossy().replace('\\', "/"));
    let output = self
      .git_cmd()
      .args(["show", &spec])
      .output()
      .context("Failed to read file from commit")?;

    if !output.status.success() {
      return Ok(None);
    }
    Ok(Some(String::from_utf8(output.stdout)?))
  }

  /// Push refspecs to a remote in a single invocation
  pub fn push(&self, remote: &str, refspecs: &[String], atomic: bool) -> FlowResult<()> {
    println!("   Pushing to remote '{}'...", remote);

    let mut args = vec!["push", "--quiet"];
    if atomic {
      args.push("--atomic");
    }
    args.push(remote);
    args.extend(refspecs.iter().map(String::as_str));

    let output = self.git_cmd().args(&args).output().context("Failed to push")?;
    if !output.status.success() {
      return Err(FlowError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        reason: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    println!("   ✅ Pushed {}", refspecs.join(" "));
    Ok(())
  }

  /// Raw `git log` output in the layout the commit parser expects
  pub fn log_raw(&self, revisions: &[&str], grep: &[String]) -> FlowResult<String> {
    let mut args: Vec<String> = vec!["log".to_string()];
    args.extend(LOG_FORMAT_ARGS.iter().map(|s| s.to_string()));
    if !grep.is_empty() {
      args.push("--regexp-ignore-case".to_string());
      args.extend(grep.iter().map(|pattern| format!("--grep={}", pattern)));
    }
    args.extend(revisions.iter().map(|s| s.to_string()));
    args.push("--".to_string());

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = self.output(&args)?;
    Ok(String::from_utf8(output.stdout)?)
  }

  /// Every commit SHA reachable from `rev`; empty if the ref is missing
  pub fn reachable_shas(&self, rev: &str) -> FlowResult<HashSet<String>> {
    if !self.ref_exists(rev)? {
      return Ok(HashSet::new());
    }
    let stdout = self.run(&["rev-list", rev])?;
    Ok(
      stdout
        .lines()
        .map(str::trim)
        .filter(|line| is_valid_sha(line))
        .map(String::from)
        .collect(),
    )
  }

  /// Cherry-pick a commit onto the current branch, recording its origin
  pub fn cherry_pick(&self, sha: &str) -> FlowResult<()> {
    self.run(&["cherry-pick", "-x", "--allow-empty", sha])?;
    Ok(())
  }

  /// Abort an in-progress cherry-pick, ignoring "nothing to abort"
  pub fn cherry_pick_abort(&self) -> FlowResult<()> {
    if !self.succeeds(&["cherry-pick", "--abort"])? {
      tracing::debug!("no cherry-pick in progress to abort");
    }
    Ok(())
  }
}
