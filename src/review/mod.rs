//! Code review capability
//!
//! Staging a release finalises it in the review tool. Teams without one use
//! the `none` backend; the `file` backend records finalised versions in a
//! TOML file so the step is observable and reversible.

use crate::action::{Action, Noop};
use crate::core::config::{CodeReviewConfig, CodeReviewKind};
use crate::core::error::{FlowResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{Array, DocumentMut};

pub trait CodeReviewTool {
  /// Close the review for `version`, returning the action that reopens it
  fn finalise_release(&self, version: &str) -> FlowResult<Box<dyn Action>>;
}

/// Review backend selected by configuration
pub fn open(config: &CodeReviewConfig, repo_root: &Path) -> Box<dyn CodeReviewTool> {
  match config.kind {
    CodeReviewKind::None => Box::new(NoReview),
    CodeReviewKind::File => Box::new(FileReview::new(repo_root.join(&config.path))),
  }
}

pub struct NoReview;

impl CodeReviewTool for NoReview {
  fn finalise_release(&self, version: &str) -> FlowResult<Box<dyn Action>> {
    tracing::debug!(version, "no code review tool configured");
    Ok(Box::new(Noop))
  }
}

/// Finalised versions kept as `finalised = [...]` in a TOML file
pub struct FileReview {
  path: PathBuf,
}

impl FileReview {
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }

  fn read(&self) -> FlowResult<DocumentMut> {
    if !self.path.exists() {
      return Ok(DocumentMut::new());
    }
    let content = fs::read_to_string(&self.path)
      .with_context(|| format!("Failed to read reviews from {}", self.path.display()))?;
    content
      .parse()
      .with_context(|| format!("Invalid review file {}", self.path.display()))
  }

  fn write(&self, doc: &DocumentMut) -> FlowResult<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(&self.path, doc.to_string()).with_context(|| format!("Failed to write {}", self.path.display()))
  }

  /// Versions finalised so far, in the order they were recorded
  pub fn finalised(&self) -> FlowResult<Vec<String>> {
    let doc = self.read()?;
    Ok(
      doc
        .get("finalised")
        .and_then(|item| item.as_array())
        .map(|array| array.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default(),
    )
  }

  fn update(&self, edit: impl FnOnce(&mut Array)) -> FlowResult<()> {
    let mut doc = self.read()?;
    if doc.get("finalised").and_then(|item| item.as_array()).is_none() {
      doc["finalised"] = toml_edit::value(Array::new());
    }
    if let Some(array) = doc["finalised"].as_array_mut() {
      edit(array);
    }
    self.write(&doc)
  }
}

impl CodeReviewTool for FileReview {
  fn finalise_release(&self, version: &str) -> FlowResult<Box<dyn Action>> {
    if self.finalised()?.iter().any(|v| v == version) {
      return Ok(Box::new(Noop));
    }

    self.update(|array| array.push(version))?;
    println!("   📋 Finalised release {} for review", version);
    Ok(Box::new(ReopenRelease {
      review: FileReview::new(self.path.clone()),
      version: version.to_string(),
    }))
  }
}

/// Removes a version from the finalised list again
pub struct ReopenRelease {
  review: FileReview,
  version: String,
}

impl Action for ReopenRelease {
  fn rollback(&self) -> FlowResult<()> {
    self
      .review
      .update(|array| array.retain(|v| v.as_str() != Some(self.version.as_str())))
  }

  fn describe(&self) -> String {
    format!("reopen release {}", self.version)
  }
}
