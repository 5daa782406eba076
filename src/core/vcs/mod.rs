pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use serde::Serialize;

/// A local branch paired with the remote branch it tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRef {
  pub local_name: String,
  pub remote_name: String,
  pub remote_branch_name: String,
  pub local_hash: Option<String>,
  pub remote_hash: Option<String>,
}

/// Relation between a local branch and its upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
  InSync,
  LocalOnly,
  RemoteOnly,
  Diverged,
  Missing,
}

impl BranchRef {
  /// `<remote>/<branch>` as understood by rev-parse
  pub fn remote_ref(&self) -> String {
    format!("{}/{}", self.remote_name, self.remote_branch_name)
  }

  pub fn status(&self) -> BranchStatus {
    match (&self.local_hash, &self.remote_hash) {
      (Some(local), Some(remote)) if local == remote => BranchStatus::InSync,
      (Some(_), Some(_)) => BranchStatus::Diverged,
      (Some(_), None) => BranchStatus::LocalOnly,
      (None, Some(_)) => BranchStatus::RemoteOnly,
      (None, None) => BranchStatus::Missing,
    }
  }

  pub fn is_synchronized(&self) -> bool {
    self.status() == BranchStatus::InSync
  }

  /// True if the branch exists locally or on the remote
  pub fn exists(&self) -> bool {
    self.status() != BranchStatus::Missing
  }
}
