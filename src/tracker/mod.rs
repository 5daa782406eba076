//! Issue tracker capability
//!
//! Workflows only need to look stories up by the ids found in commit tags and
//! move them through their lifecycle. Each transition hands back the
//! [`Action`] that reverts it, so tracker state unwinds together with git.

pub mod file;

pub use file::FileTracker;

use crate::action::Action;
use crate::core::config::{TrackerConfig, TrackerKind};
use crate::core::error::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Story lifecycle, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryState {
  New,
  Started,
  Implemented,
  Staged,
  Released,
}

impl StoryState {
  pub fn as_str(self) -> &'static str {
    match self {
      StoryState::New => "new",
      StoryState::Started => "started",
      StoryState::Implemented => "implemented",
      StoryState::Staged => "staged",
      StoryState::Released => "released",
    }
  }
}

impl FromStr for StoryState {
  type Err = FlowError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "new" => Ok(StoryState::New),
      "started" => Ok(StoryState::Started),
      "implemented" => Ok(StoryState::Implemented),
      "staged" => Ok(StoryState::Staged),
      "released" => Ok(StoryState::Released),
      other => Err(FlowError::with_help(
        format!("Unknown story state '{}'", other),
        "Valid states: new, started, implemented, staged, released",
      )),
    }
  }
}

impl fmt::Display for StoryState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A story as seen by workflows
pub trait Story {
  /// Id used in `Story-Id:` commit tags
  fn readable_id(&self) -> &str;

  fn title(&self) -> &str;

  fn state(&self) -> StoryState;

  fn start(&self) -> FlowResult<Box<dyn Action>>;

  fn mark_as_implemented(&self) -> FlowResult<Box<dyn Action>>;

  fn stage(&self) -> FlowResult<Box<dyn Action>>;

  fn release(&self) -> FlowResult<Box<dyn Action>>;
}

pub trait IssueTracker {
  /// Stories whose readable id is one of `tags`; unknown ids are left out
  fn list_stories_by_tag(&self, tags: &[String]) -> FlowResult<Vec<Box<dyn Story>>>;
}

/// Tracker backend selected by configuration
pub fn open(config: &TrackerConfig, repo_root: &Path) -> Box<dyn IssueTracker> {
  match config.kind {
    TrackerKind::File => Box::new(FileTracker::new(repo_root.join(&config.path))),
  }
}
