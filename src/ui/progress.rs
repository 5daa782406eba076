//! Progress bar for replaying commits onto another branch
//!
//! `linya` draws on stderr, so stdout keeps only the summary lines.

use crate::commits::Commit;
use linya::{Bar, Progress};

pub struct PickProgress {
  progress: Progress,
  bar: Bar,
}

impl PickProgress {
  pub fn new(total: usize, target: &str) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, format!("Cherry-picking onto {}", target));
    Self { progress, bar }
  }

  /// Count one commit as applied
  pub fn picked(&mut self, commit: &Commit) {
    tracing::debug!(sha = commit.short_sha(), title = %commit.title, "picked");
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
