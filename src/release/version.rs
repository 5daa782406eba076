//! Project version handling
//!
//! Trunk always carries the next version as a `-dev` pre-release. Staging
//! commits the plain version, which is also what gets tagged.
//!
//! | branch   | version       |
//! |----------|---------------|
//! | trunk    | `1.3.0-dev`   |
//! | release  | `1.2.0-dev`   |
//! | staging  | `1.2.0`       |

use crate::core::config::VersionConfig;
use crate::core::error::{FlowError, FlowResult, ResultExt};
use crate::core::vcs::SystemGit;
use semver::{Prerelease, Version};
use std::fs;
use toml_edit::{DocumentMut, Item};

const DEV: &str = "dev";

/// `X.Y.Z-dev`
pub fn dev_version(version: &Version) -> Version {
  let mut dev = Version::new(version.major, version.minor, version.patch);
  dev.pre = Prerelease::new(DEV).unwrap_or(Prerelease::EMPTY);
  dev
}

/// `X.Y.Z` without pre-release or build metadata
pub fn release_version(version: &Version) -> Version {
  Version::new(version.major, version.minor, version.patch)
}

/// Trunk version once `version` has branched off: `X.(Y+1).0-dev`
pub fn next_dev_version(version: &Version) -> Version {
  dev_version(&Version::new(version.major, version.minor + 1, 0))
}

/// Tag name for a release
pub fn tag_name(version: &Version) -> String {
  format!("v{}", release_version(version))
}

fn lookup<'a>(doc: &'a DocumentMut, key_path: &[&str]) -> Option<&'a Item> {
  let mut item = doc.as_item();
  for key in key_path {
    item = item.get(*key)?;
  }
  Some(item)
}

/// Read the version at `key_path` from TOML text
pub fn read_version(content: &str, key_path: &[&str]) -> FlowResult<Version> {
  let doc: DocumentMut = content.parse()?;
  let raw = lookup(&doc, key_path)
    .and_then(Item::as_str)
    .ok_or_else(|| FlowError::message(format!("No version string at '{}'", key_path.join("."))))?;
  Ok(Version::parse(raw)?)
}

/// Replace the version at `key_path`, keeping everything else as written
pub fn write_version(content: &str, key_path: &[&str], version: &Version) -> FlowResult<String> {
  let mut doc: DocumentMut = content.parse()?;

  let mut item = doc.as_item_mut();
  for key in key_path {
    item = item
      .get_mut(*key)
      .ok_or_else(|| FlowError::message(format!("No version string at '{}'", key_path.join("."))))?;
  }
  if item.as_str().is_none() {
    return Err(FlowError::message(format!("'{}' is not a string", key_path.join("."))));
  }
  *item = toml_edit::value(version.to_string());

  Ok(doc.to_string())
}

/// Version recorded in the version file at `rev`
pub fn version_at(git: &SystemGit, config: &VersionConfig, rev: &str) -> FlowResult<Version> {
  let content = git.show_file(rev, &config.file)?.ok_or_else(|| {
    FlowError::with_help(
      format!("{} does not exist at {}", config.file.display(), rev),
      "Set [version] file in trunkflow.toml to the file that holds the project version.",
    )
  })?;
  read_version(&content, &config.key_path()).with_context(|| format!("Invalid version file at {}", rev))
}

/// Write `version` into the checked-out version file and commit it
pub fn commit_version(git: &SystemGit, config: &VersionConfig, version: &Version) -> FlowResult<String> {
  let path = git.work_tree().join(&config.file);
  let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
  let updated = write_version(&content, &config.key_path(), version)?;
  fs::write(&path, updated).with_context(|| format!("Failed to write {}", path.display()))?;

  git.commit_file(&config.file, &format!("Bump version to {}", version))
}

#[cfg(test)]
mod tests {
  use super::*;

  const MANIFEST: &str = r#"[package]
name = "shop" # the storefront
version = "1.2.0-dev"
edition = "2024"

[dependencies]
serde = "1"
"#;

  fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
  }

  #[test]
  fn test_bump_arithmetic() {
    assert_eq!(dev_version(&v("1.2.0")), v("1.2.0-dev"));
    assert_eq!(release_version(&v("1.2.0-dev")), v("1.2.0"));
    assert_eq!(next_dev_version(&v("1.2.0-dev")), v("1.3.0-dev"));
    assert_eq!(next_dev_version(&v("0.9.4")), v("0.10.0-dev"));
    assert_eq!(tag_name(&v("2.0.1-dev")), "v2.0.1");
  }

  #[test]
  fn test_read_nested_key() {
    assert_eq!(read_version(MANIFEST, &["package", "version"]).unwrap(), v("1.2.0-dev"));
  }

  #[test]
  fn test_write_keeps_layout() {
    let updated = write_version(MANIFEST, &["package", "version"], &v("1.3.0-dev")).unwrap();
    assert!(updated.contains(r#"version = "1.3.0-dev""#));
    assert!(updated.contains("# the storefront"));
    assert!(updated.contains(r#"serde = "1""#));
    assert_eq!(read_version(&updated, &["package", "version"]).unwrap(), v("1.3.0-dev"));
  }

  #[test]
  fn test_missing_or_invalid_version() {
    assert!(read_version(MANIFEST, &["workspace", "version"]).is_err());
    assert!(read_version(MANIFEST, &["package", "name"]).is_err());
    assert!(write_version(MANIFEST, &["package", "missing"], &v("1.0.0")).is_err());
    assert!(write_version("[package]\nversion = 3\n", &["package", "version"], &v("1.0.0")).is_err());
  }
}
