//! Release workflows
//!
//! A release moves through four long-lived branches:
//!
//! ```text
//! trunk ──start──▶ release ──stage──▶ staging ──deploy──▶ stable
//!   │                 ▲
//!   └──cherry-pick────┘
//! ```
//!
//! Every workflow is a straight sequence of steps. Each step performs one
//! mutation and registers its compensation on the [`ActionChain`] before the
//! next step runs, so a failure anywhere unwinds everything done so far. The
//! final push cannot be taken back; its compensation only reports what the
//! remote now holds. Switching back to the original branch happens after the
//! chain is settled.
//!
//! [`ActionChain`]: crate::action::ActionChain

pub mod cherry_pick;
pub mod deploy;
pub mod stage;
pub mod start;
pub mod stories;
pub mod version;

use crate::core::context::WorkflowContext;
use crate::core::error::{FlowError, FlowResult};
use crate::core::vcs::{BranchRef, BranchStatus};

/// Fast-forward refspec for a branch
pub(crate) fn branch_refspec(branch: &str) -> String {
  format!("refs/heads/{0}:refs/heads/{0}", branch)
}

/// Forced refspec for branches that are reset rather than advanced
pub(crate) fn forced_refspec(branch: &str) -> String {
  format!("+{}", branch_refspec(branch))
}

/// Resolve `rev` or fail with a hint on how to create it
pub(crate) fn require_ref(ctx: &WorkflowContext, rev: &str, help: &str) -> FlowResult<String> {
  ctx
    .git
    .rev_parse(rev)?
    .ok_or_else(|| FlowError::with_help(format!("'{}' does not exist", rev), help))
}

/// The release branch and its upstream, refusing when both exist but point
/// at different commits
pub(crate) fn release_branch(ctx: &WorkflowContext) -> FlowResult<BranchRef> {
  let branches = ctx.branches();
  let release = ctx.git.branch_ref(&branches.release, &branches.remote)?;
  if release.status() == BranchStatus::Diverged {
    return Err(FlowError::with_help(
      format!(
        "Release branch '{}' does not match '{}'",
        release.local_name,
        release.remote_ref()
      ),
      format!(
        "Push or reset '{}' so both sides point at the same commit.",
        branches.release
      ),
    ));
  }
  Ok(release)
}

/// Switch back to the branch the workflow started on.
///
/// Runs after the action chain is settled, so a failure only warns.
pub(crate) fn return_to(ctx: &WorkflowContext, original: &str) {
  if let Err(e) = switch_back(ctx, original) {
    tracing::warn!(branch = original, error = %e, "could not switch back");
    println!("   ⚠️  Could not switch back to '{}': {}", original, e);
  }
}

fn switch_back(ctx: &WorkflowContext, original: &str) -> FlowResult<()> {
  if ctx.git.current_branch()? == original {
    return Ok(());
  }
  if ctx.git.ref_exists(original)? {
    ctx.git.checkout(original)?;
  } else {
    println!("   ℹ️  '{}' no longer exists, staying on '{}'", original, ctx.git.current_branch()?);
  }
  Ok(())
}
