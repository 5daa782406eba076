use crate::core::error::{ConfigError, FlowError, FlowResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for trunkflow
/// Searched in order: trunkflow.toml, .trunkflow.toml, .config/trunkflow.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowConfig {
  #[serde(default)]
  pub branches: BranchConfig,
  #[serde(default)]
  pub version: VersionConfig,
  #[serde(default)]
  pub tracker: TrackerConfig,
  #[serde(default)]
  pub code_review: CodeReviewConfig,
}

/// Names of the long-lived branches and the remote they track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchConfig {
  #[serde(default = "default_trunk")]
  pub trunk: String,
  #[serde(default = "default_release")]
  pub release: String,
  #[serde(default = "default_staging")]
  pub staging: String,
  #[serde(default = "default_stable")]
  pub stable: String,
  #[serde(default = "default_remote")]
  pub remote: String,
  /// Prefix for story branches created by `story start`
  #[serde(default = "default_story_prefix")]
  pub story_prefix: String,
}

fn default_trunk() -> String {
  "develop".to_string()
}

fn default_release() -> String {
  "release".to_string()
}

fn default_staging() -> String {
  "stage".to_string()
}

fn default_stable() -> String {
  "stable".to_string()
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_story_prefix() -> String {
  "story/".to_string()
}

impl Default for BranchConfig {
  fn default() -> Self {
    Self {
      trunk: default_trunk(),
      release: default_release(),
      staging: default_staging(),
      stable: default_stable(),
      remote: default_remote(),
      story_prefix: default_story_prefix(),
    }
  }
}

impl BranchConfig {
  /// `<remote>/<branch>`
  pub fn upstream(&self, branch: &str) -> String {
    format!("{}/{}", self.remote, branch)
  }

  /// Refs consulted by source attribution, in priority order
  pub fn source_priority(&self) -> Vec<String> {
    vec![
      self.trunk.clone(),
      self.upstream(&self.trunk),
      self.release.clone(),
      self.upstream(&self.release),
    ]
  }

  /// Refs that count as trunk lineage
  pub fn trunk_refs(&self) -> Vec<String> {
    vec![self.trunk.clone(), self.upstream(&self.trunk)]
  }

  fn validate(&self) -> FlowResult<()> {
    let named = [
      ("branches.trunk", &self.trunk),
      ("branches.release", &self.release),
      ("branches.staging", &self.staging),
      ("branches.stable", &self.stable),
      ("branches.remote", &self.remote),
    ];
    for (field, value) in named {
      if value.trim().is_empty() || value.contains(char::is_whitespace) {
        return Err(FlowError::Config(ConfigError::InvalidField {
          field: field.to_string(),
          reason: format!("'{}' is not a valid ref name", value),
        }));
      }
    }

    let mut seen = std::collections::HashSet::new();
    for (field, value) in named.iter().take(4) {
      if !seen.insert(value.as_str()) {
        return Err(FlowError::Config(ConfigError::InvalidField {
          field: field.to_string(),
          reason: format!("branch '{}' is used for more than one role", value),
        }));
      }
    }
    Ok(())
  }
}

/// Where the project version lives
///
/// # Example
///
/// ```toml
/// [version]
/// file = "Cargo.toml"
/// key = "package.version"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionConfig {
  /// TOML file holding the version, relative to the repository root
  #[serde(default = "default_version_file")]
  pub file: PathBuf,
  /// Dotted key path of the version inside the file
  #[serde(default = "default_version_key")]
  pub key: String,
}

fn default_version_file() -> PathBuf {
  PathBuf::from("Cargo.toml")
}

fn default_version_key() -> String {
  "package.version".to_string()
}

impl Default for VersionConfig {
  fn default() -> Self {
    Self {
      file: default_version_file(),
      key: default_version_key(),
    }
  }
}

impl VersionConfig {
  pub fn key_path(&self) -> Vec<&str> {
    self.key.split('.').filter(|s| !s.is_empty()).collect()
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
  /// Stories kept in a TOML file inside the repository
  #[default]
  File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackerConfig {
  #[serde(default)]
  pub kind: TrackerKind,
  #[serde(default = "default_tracker_path")]
  pub path: PathBuf,
}

fn default_tracker_path() -> PathBuf {
  PathBuf::from(".trunkflow/stories.toml")
}

impl Default for TrackerConfig {
  fn default() -> Self {
    Self {
      kind: TrackerKind::default(),
      path: default_tracker_path(),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CodeReviewKind {
  /// Releases are not tracked by any review tool
  #[default]
  None,
  /// Finalised releases recorded in a TOML file
  File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeReviewConfig {
  #[serde(default)]
  pub kind: CodeReviewKind,
  #[serde(default = "default_review_path")]
  pub path: PathBuf,
}

fn default_review_path() -> PathBuf {
  PathBuf::from(".trunkflow/reviews.toml")
}

impl Default for CodeReviewConfig {
  fn default() -> Self {
    Self {
      kind: CodeReviewKind::default(),
      path: default_review_path(),
    }
  }
}

impl FlowConfig {
  /// Find config file in search order: trunkflow.toml, .trunkflow.toml, .config/trunkflow.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("trunkflow.toml"),
      path.join(".trunkflow.toml"),
      path.join(".config").join("trunkflow.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from trunkflow.toml (searches multiple locations)
  pub fn load(path: &Path) -> FlowResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      FlowError::Config(ConfigError::NotFound {
        repo_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::from_toml(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "loaded configuration");
    Ok(config)
  }

  pub fn from_toml(content: &str) -> FlowResult<Self> {
    let config: FlowConfig = toml_edit::de::from_str(content)?;
    config.branches.validate()?;
    if config.version.key_path().is_empty() {
      return Err(FlowError::Config(ConfigError::InvalidField {
        field: "version.key".to_string(),
        reason: "key path is empty".to_string(),
      }));
    }
    Ok(config)
  }

  /// Save config to trunkflow.toml (default location)
  pub fn save(&self, path: &Path) -> FlowResult<PathBuf> {
    let config_path = path.join("trunkflow.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(config_path)
  }

  /// Check if config exists at the given path
  pub fn exists(path: &Path) -> bool {
    Self::find_config_path(path).is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = FlowConfig::from_toml("").unwrap();
    assert_eq!(config, FlowConfig::default());
    assert_eq!(config.branches.trunk, "develop");
    assert_eq!(config.branches.upstream("release"), "origin/release");
    assert_eq!(config.version.key_path(), vec!["package", "version"]);
  }

  #[test]
  fn test_partial_branch_section() {
    let config = FlowConfig::from_toml(
      r#"
[branches]
trunk = "main"
remote = "upstream"
"#,
    )
    .unwrap();
    assert_eq!(config.branches.trunk, "main");
    assert_eq!(config.branches.staging, "stage");
    assert_eq!(
      config.branches.source_priority(),
      vec!["main", "upstream/main", "release", "upstream/release"]
    );
  }

  #[test]
  fn test_duplicate_branch_roles_rejected() {
    let result = FlowConfig::from_toml(
      r#"
[branches]
trunk = "main"
stable = "main"
"#,
    );
    assert!(matches!(result, Err(FlowError::Config(ConfigError::InvalidField { .. }))));
  }

  #[test]
  fn test_empty_version_key_rejected() {
    assert!(FlowConfig::from_toml("[version]\nkey = \"\"\n").is_err());
  }

  #[test]
  fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = FlowConfig::default();
    config.code_review.kind = CodeReviewKind::File;
    config.save(dir.path()).unwrap();

    assert!(FlowConfig::exists(dir.path()));
    assert_eq!(FlowConfig::load(dir.path()).unwrap(), config);
  }

  #[test]
  fn test_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      FlowConfig::load(dir.path()),
      Err(FlowError::Config(ConfigError::NotFound { .. }))
    ));
  }
}
