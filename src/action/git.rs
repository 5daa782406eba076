//! Git ref compensations
//!
//! Each [`GitUndo`] carries the pre-mutation state it needs (a branch's
//! previous commit, the name of a tag) so it can be inspected, logged and
//! serialized like any other data.

use super::Action;
use crate::core::error::{FlowResult, short_sha};
use crate::core::vcs::SystemGit;
use serde::{Deserialize, Serialize};

/// Inverse of one git ref mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitUndo {
  /// Move a branch back to where it pointed before
  ResetBranch { name: String, previous_sha: String },
  /// Remove a branch the workflow created
  DeleteBranch { name: String },
  /// Recreate a branch the workflow deleted
  RestoreBranch { name: String, sha: String },
  /// Remove a tag the workflow created
  DeleteTag { name: String },
  /// Switch back to the branch that was checked out
  Checkout { branch: String },
}

impl GitUndo {
  fn apply(&self, git: &SystemGit) -> FlowResult<()> {
    match self {
      GitUndo::ResetBranch { name, previous_sha } => git.reset_branch(name, previous_sha),
      GitUndo::DeleteBranch { name } => {
        if git.current_branch()? == *name {
          git.detach_head()?;
        }
        git.delete_branch(name)
      }
      GitUndo::RestoreBranch { name, sha } => {
        if git.ref_exists(&format!("refs/heads/{}", name))? {
          git.reset_branch(name, sha)
        } else {
          git.create_branch_at(name, sha)
        }
      }
      GitUndo::DeleteTag { name } => {
        if git.tag_exists(name)? {
          git.delete_tag(name)?;
        }
        Ok(())
      }
      GitUndo::Checkout { branch } => git.checkout(branch),
    }
  }
}

/// A [`GitUndo`] bound to the repository it applies to
pub struct GitAction {
  git: SystemGit,
  undo: GitUndo,
}

impl GitAction {
  pub fn new(git: &SystemGit, undo: GitUndo) -> Self {
    Self { git: git.clone(), undo }
  }
}

impl Action for GitAction {
  fn rollback(&self) -> FlowResult<()> {
    self.undo.apply(&self.git)
  }

  fn describe(&self) -> String {
    match &self.undo {
      GitUndo::ResetBranch { name, previous_sha } => {
        format!("reset branch '{}' to {}", name, short_sha(previous_sha))
      }
      GitUndo::DeleteBranch { name } => format!("delete branch '{}'", name),
      GitUndo::RestoreBranch { name, sha } => format!("restore branch '{}' at {}", name, short_sha(sha)),
      GitUndo::DeleteTag { name } => format!("delete tag '{}'", name),
      GitUndo::Checkout { branch } => format!("check out '{}'", branch),
    }
  }
}
