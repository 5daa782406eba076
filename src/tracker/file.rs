//! TOML file issue tracker
//!
//! Stories live in a plain file, which makes the whole release process usable
//! offline and in tests:
//!
//! ```toml
//! [[stories]]
//! id = "ABC-1"
//! title = "Export invoices"
//! state = "implemented"
//! ```
//!
//! State changes are written back with `toml_edit`, so comments and layout
//! the user added survive.

use super::{IssueTracker, Story, StoryState};
use crate::action::{Action, Noop};
use crate::core::error::{FlowError, FlowResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default = "default_state")]
  pub state: StoryState,
}

fn default_state() -> StoryState {
  StoryState::New
}

#[derive(Debug, Default, Deserialize)]
struct StoryFile {
  #[serde(default)]
  stories: Vec<StoryRecord>,
}

/// Issue tracker backed by a TOML story file
pub struct FileTracker {
  path: PathBuf,
}

impl FileTracker {
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }

  #[cfg(test)]
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// All stories in the file; a missing file holds none
  pub fn load(&self) -> FlowResult<Vec<StoryRecord>> {
    if !self.path.exists() {
      tracing::debug!(path = %self.path.display(), "story file does not exist");
      return Ok(Vec::new());
    }

    let content = fs::read_to_string(&self.path)
      .with_context(|| format!("Failed to read stories from {}", self.path.display()))?;
    let file: StoryFile = toml_edit::de::from_str(&content)
      .with_context(|| format!("Invalid story file {}", self.path.display()))?;
    Ok(file.stories)
  }
}

impl IssueTracker for FileTracker {
  fn list_stories_by_tag(&self, tags: &[String]) -> FlowResult<Vec<Box<dyn Story>>> {
    let stories = self
      .load()?
      .into_iter()
      .filter(|record| tags.contains(&record.id))
      .map(|record| {
        Box::new(FileStory {
          path: self.path.clone(),
          record,
        }) as Box<dyn Story>
      })
      .collect();
    Ok(stories)
  }
}

/// Set a story's state in place, returning the state it had before
fn write_state(path: &Path, story_id: &str, state: StoryState) -> FlowResult<StoryState> {
  let content =
    fs::read_to_string(path).with_context(|| format!("Failed to read stories from {}", path.display()))?;
  let mut doc: DocumentMut = content
    .parse()
    .with_context(|| format!("Invalid story file {}", path.display()))?;

  let story = doc
    .get_mut("stories")
    .and_then(|item| item.as_array_of_tables_mut())
    .and_then(|stories| {
      stories
        .iter_mut()
        .find(|table| table.get("id").and_then(|v| v.as_str()) == Some(story_id))
    })
    .ok_or_else(|| FlowError::message(format!("Story '{}' not found in {}", story_id, path.display())))?;

  let previous = match story.get("state").and_then(|v| v.as_str()) {
    Some(s) => s.parse()?,
    None => StoryState::New,
  };
  story["state"] = toml_edit::value(state.as_str());

  fs::write(path, doc.to_string()).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(previous)
}

struct FileStory {
  path: PathBuf,
  record: StoryRecord,
}

impl FileStory {
  fn transition(&self, to: StoryState) -> FlowResult<Box<dyn Action>> {
    let from = write_state(&self.path, &self.record.id, to)?;
    if from == to {
      return Ok(Box::new(Noop));
    }

    tracing::info!(story = %self.record.id, %from, %to, "story transitioned");
    println!("   📝 {}: {} → {}", self.record.id, from, to);
    Ok(Box::new(RevertStoryTransition {
      path: self.path.clone(),
      story_id: self.record.id.clone(),
      from_state: from,
    }))
  }
}

impl Story for FileStory {
  fn readable_id(&self) -> &str {
    &self.record.id
  }

  fn title(&self) -> &str {
    &self.record.title
  }

  fn state(&self) -> StoryState {
    self.record.state
  }

  fn start(&self) -> FlowResult<Box<dyn Action>> {
    self.transition(StoryState::Started)
  }

  fn mark_as_implemented(&self) -> FlowResult<Box<dyn Action>> {
    self.transition(StoryState::Implemented)
  }

  fn stage(&self) -> FlowResult<Box<dyn Action>> {
    self.transition(StoryState::Staged)
  }

  fn release(&self) -> FlowResult<Box<dyn Action>> {
    self.transition(StoryState::Released)
  }
}

/// Puts a story back into the state it had before a transition
#[derive(Debug, Clone, Serialize)]
pub struct RevertStoryTransition {
  path: PathBuf,
  pub story_id: String,
  pub from_state: StoryState,
}

impl Action for RevertStoryTransition {
  fn rollback(&self) -> FlowResult<()> {
    write_state(&self.path, &self.story_id, self.from_state)?;
    Ok(())
  }

  fn describe(&self) -> String {
    format!("move story {} back to {}", self.story_id, self.from_state)
  }
}
