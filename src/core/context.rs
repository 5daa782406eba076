//! Workflow context - build once, pass everywhere
//!
//! ```text
//! main.rs:
//!   WorkflowContext::build() -> &WorkflowContext
//!   |
//!   v
//! release/start.rs, story/start.rs, etc:
//!   fn run(ctx: &WorkflowContext, ...)
//! ```

use crate::action::{ActionChain, GitAction, GitUndo};
use crate::core::config::{BranchConfig, FlowConfig};
use crate::core::error::FlowResult;
use crate::core::vcs::SystemGit;
use crate::review::{self, CodeReviewTool};
use crate::tracker::{self, IssueTracker};
use std::path::{Path, PathBuf};

/// Repository, git handle and configuration of one invocation
pub struct WorkflowContext {
  /// Working tree root (absolute path)
  pub root: PathBuf,

  pub git: SystemGit,

  /// Loaded from trunkflow.toml
  pub config: FlowConfig,
}

impl WorkflowContext {
  /// Open the repository containing `path` and load its configuration
  pub fn build(path: &Path) -> FlowResult<Self> {
    let git = SystemGit::open(path)?;
    let root = git.work_tree().to_path_buf();
    let config = FlowConfig::load(&root)?;

    Ok(Self { root, git, config })
  }

  pub fn branches(&self) -> &BranchConfig {
    &self.config.branches
  }

  pub fn tracker(&self) -> Box<dyn IssueTracker> {
    tracker::open(&self.config.tracker, &self.root)
  }

  pub fn review(&self) -> Box<dyn CodeReviewTool> {
    review::open(&self.config.code_review, &self.root)
  }

  /// Common start of every mutating workflow.
  ///
  /// Refuses a dirty working tree, then registers a compensation that
  /// returns to whatever is checked out now. Returns that branch (or the
  /// commit, when HEAD is detached) so the workflow can switch back on
  /// success.
  pub fn begin(&self, chain: &mut ActionChain) -> FlowResult<String> {
    self.git.ensure_clean_work_tree()?;

    let mut current = self.git.current_branch()?;
    if current == "HEAD" {
      current = self.git.head_commit()?;
    }

    chain.push(GitAction::new(&self.git, GitUndo::Checkout {
      branch: current.clone(),
    }));
    Ok(current)
  }

  /// Fetch the configured remote
  pub fn fetch(&self) -> FlowResult<()> {
    self.git.fetch(&self.branches().remote)
  }
}
