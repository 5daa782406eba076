//! Error types for trunkflow with contextual messages and exit codes
//!
//! Every workflow returns `FlowResult`. Errors are grouped by who has to act:
//! the user (bad config, wrong arguments), the system (git, I/O), validation
//! (story states, change lineage) and rollback failures, which always need a
//! human to clean up by hand.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for trunkflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, I/O)
  System = 2,
  /// Validation failure (story states, reachability)
  Validation = 3,
  /// Compensations failed, manual cleanup required
  Rollback = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for trunkflow
#[derive(Debug)]
pub enum FlowError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Malformed commit log text
  Parse(ParseError),

  /// The same tag appeared twice in one commit message
  DuplicateTag { sha: String, tag: String },

  /// Missing changes that cannot be proven to come from trunk
  Reachability(Vec<UnverifiedChange>),

  /// Stories not in the state a workflow requires
  StoryState(Vec<StoryStateMismatch>),

  /// One or more compensations failed while unwinding
  RollbackFailed {
    failures: usize,
    cause: Option<Box<FlowError>>,
  },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl FlowError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    FlowError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    FlowError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      FlowError::Message { message, context, help } => FlowError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      FlowError::Config(_) => ExitCode::User,
      FlowError::Git(_) => ExitCode::System,
      FlowError::Parse(_) => ExitCode::System,
      FlowError::DuplicateTag { .. } => ExitCode::Validation,
      FlowError::Reachability(_) => ExitCode::Validation,
      FlowError::StoryState(_) => ExitCode::Validation,
      FlowError::RollbackFailed { .. } => ExitCode::Rollback,
      FlowError::Io(_) => ExitCode::System,
      FlowError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      FlowError::Config(e) => e.help_message(),
      FlowError::Git(e) => e.help_message(),
      FlowError::DuplicateTag { sha, .. } => Some(format!(
        "Reword commit {} so that it carries the tag only once.",
        short_sha(sha)
      )),
      FlowError::Reachability(_) => Some(
        "Land these changes on trunk first, then run the cherry-pick again.".to_string(),
      ),
      FlowError::StoryState(_) => Some("Move the stories forward in the issue tracker and try again.".to_string()),
      FlowError::RollbackFailed { .. } => Some(
        "Some steps could not be undone. Inspect the log above and restore the listed refs and stories by hand."
          .to_string(),
      ),
      FlowError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for FlowError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FlowError::Config(e) => write!(f, "{}", e),
      FlowError::Git(e) => write!(f, "{}", e),
      FlowError::Parse(e) => write!(f, "{}", e),
      FlowError::DuplicateTag { sha, tag } => {
        write!(f, "Commit {} contains more than one {} tag", short_sha(sha), tag)
      }
      FlowError::Reachability(changes) => {
        write!(f, "Refusing to cherry-pick changes that are not reachable from trunk:")?;
        for change in changes {
          write!(f, "\n  {} (story {})", change.change_id, change.story_id)?;
          for (sha, source) in &change.commits {
            write!(f, "\n    {} via {}", short_sha(sha), if source.is_empty() { "?" } else { source })?;
          }
        }
        Ok(())
      }
      FlowError::StoryState(mismatches) => {
        write!(f, "Stories are not in the required state:")?;
        for m in mismatches {
          write!(f, "\n  {} is {}, expected {}", m.story_id, m.actual, m.expected)?;
        }
        Ok(())
      }
      FlowError::RollbackFailed { failures, cause } => {
        if let Some(cause) = cause {
          writeln!(f, "{}", cause)?;
        }
        write!(f, "Rollback failed ({} compensation(s) did not succeed)", failures)
      }
      FlowError::Io(e) => write!(f, "I/O error: {}", e),
      FlowError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for FlowError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      FlowError::Io(e) => Some(e),
      FlowError::RollbackFailed { cause: Some(cause), .. } => Some(cause.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for FlowError {
  fn from(err: io::Error) -> Self {
    FlowError::Io(err)
  }
}

impl From<String> for FlowError {
  fn from(msg: String) -> Self {
    FlowError::message(msg)
  }
}

impl From<&str> for FlowError {
  fn from(msg: &str) -> Self {
    FlowError::message(msg)
  }
}

impl From<ParseError> for FlowError {
  fn from(err: ParseError) -> Self {
    FlowError::Parse(err)
  }
}

impl From<GitError> for FlowError {
  fn from(err: GitError) -> Self {
    FlowError::Git(err)
  }
}

impl From<toml_edit::TomlError> for FlowError {
  fn from(err: toml_edit::TomlError) -> Self {
    FlowError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for FlowError {
  fn from(err: toml_edit::de::Error) -> Self {
    FlowError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for FlowError {
  fn from(err: toml_edit::ser::Error) -> Self {
    FlowError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for FlowError {
  fn from(err: serde_json::Error) -> Self {
    FlowError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for FlowError {
  fn from(err: semver::Error) -> Self {
    FlowError::message(format!("Invalid version: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for FlowError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    FlowError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// trunkflow.toml not found
  NotFound { repo_root: PathBuf },

  /// A field holds a value trunkflow cannot use
  InvalidField { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run `trunkflow init` to create a configuration file.".to_string()),
      ConfigError::InvalidField { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { repo_root } => {
        write!(
          f,
          "No trunkflow configuration found.\nExpected file: {}/trunkflow.toml",
          repo_root.display()
        )
      }
      ConfigError::InvalidField { field, reason } => {
        write!(f, "Invalid value for '{}' in config: {}", field, reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Branch operation failed
  BranchError { message: String },

  /// Working tree has uncommitted changes
  DirtyWorkTree,

  /// Push failed
  PushFailed { remote: String, reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") || reason.contains("stale info") {
          Some("The remote moved while the command was running. Fetch and run the command again.".to_string())
        } else if reason.contains("permission denied") || reason.contains("403") {
          Some("Check your credentials for the remote repository.".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "Run trunkflow from inside a git repository (looked at {}).",
        path.display()
      )),
      GitError::DirtyWorkTree => Some("Commit or stash your changes first.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim_end())
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::BranchError { message } => {
        write!(f, "Branch operation failed: {}", message)
      }
      GitError::DirtyWorkTree => write!(f, "The working tree contains uncommitted changes"),
      GitError::PushFailed { remote, reason } => {
        write!(f, "Push to {} failed: {}", remote, reason.trim_end())
      }
    }
  }
}

/// Malformed commit log text, with the offending line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
  /// 1-based line number
  pub line: usize,
  /// The raw line as it appeared in the input
  pub text: String,
  pub reason: String,
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Failed to parse git log at line {}: {}\n  {:?}", self.line, self.reason, self.text)
  }
}

impl std::error::Error for ParseError {}

/// A missing change whose commits were not reached through trunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedChange {
  pub story_id: String,
  pub change_id: String,
  /// (sha, source) of every member commit
  pub commits: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryStateMismatch {
  pub story_id: String,
  pub actual: String,
  pub expected: String,
}

/// Result type alias for trunkflow
pub type FlowResult<T> = Result<T, FlowError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> FlowResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> FlowResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<FlowError>,
{
  fn context(self, ctx: impl Into<String>) -> FlowResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> FlowResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &FlowError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

pub(crate) fn short_sha(sha: &str) -> &str {
  &sha[..sha.len().min(10)]
}
