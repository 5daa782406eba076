//! Compensating actions
//!
//! A workflow mutates local git, the remote and the issue tracker, and none of
//! those share a transaction. Every mutating step therefore registers an
//! [`Action`] that undoes it. When a later step fails, the [`ActionChain`]
//! runs the registered compensations newest first.
//!
//! ```text
//! ActionChain::run(|chain| {
//!   git.create_branch_at("release", "develop")?;
//!   chain.push(GitAction::new(&git, GitUndo::DeleteBranch { .. }));
//!   bump_version()?;            // Err here unwinds DeleteBranch
//!   Ok(())
//! })
//! ```

pub mod git;

pub use git::{GitAction, GitUndo};

use crate::core::error::{FlowError, FlowResult};

/// Undo for one already-applied effect
pub trait Action {
  /// Reverse the effect
  fn rollback(&self) -> FlowResult<()>;

  /// Human-readable summary of what `rollback` does
  fn describe(&self) -> String;
}

/// `None` is a placeholder that keeps its slot in the chain and does nothing
impl<A: Action> Action for Option<A> {
  fn rollback(&self) -> FlowResult<()> {
    match self {
      Some(action) => action.rollback(),
      None => Ok(()),
    }
  }

  fn describe(&self) -> String {
    match self {
      Some(action) => action.describe(),
      None => "nothing".to_string(),
    }
  }
}

impl Action for Box<dyn Action> {
  fn rollback(&self) -> FlowResult<()> {
    self.as_ref().rollback()
  }

  fn describe(&self) -> String {
    self.as_ref().describe()
  }
}

/// Step that turned out not to need a mutation
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl Action for Noop {
  fn rollback(&self) -> FlowResult<()> {
    Ok(())
  }

  fn describe(&self) -> String {
    "no change to undo".to_string()
  }
}

/// Compensation for effects that must not be reverted automatically.
///
/// Pushed history may already be shared, so unwinding past a push only tells
/// the operator what is left on the remote.
#[derive(Debug, Clone)]
pub struct ReportAction {
  message: String,
}

impl ReportAction {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

impl Action for ReportAction {
  fn rollback(&self) -> FlowResult<()> {
    tracing::warn!("{}", self.message);
    println!("   ⚠️  {}", self.message);
    Ok(())
  }

  fn describe(&self) -> String {
    format!("report: {}", self.message)
  }
}

struct ActionRecord {
  task: Option<String>,
  action: Box<dyn Action>,
}

impl ActionRecord {
  fn label(&self) -> String {
    match &self.task {
      Some(task) => format!("{} ({})", task, self.action.describe()),
      None => self.action.describe(),
    }
  }
}

/// Ordered compensations of one workflow invocation
#[derive(Default)]
pub struct ActionChain {
  records: Vec<ActionRecord>,
}

impl ActionChain {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Register the compensation of a step that just succeeded
  pub fn push<A: Action + 'static>(&mut self, action: A) {
    self.records.push(ActionRecord {
      task: None,
      action: Box::new(action),
    });
  }

  /// Like [`push`](Self::push), with a label naming the forward step
  pub fn push_task<A: Action + 'static>(&mut self, task: impl Into<String>, action: A) {
    self.records.push(ActionRecord {
      task: Some(task.into()),
      action: Box::new(action),
    });
  }

  /// Labels in registration order
  pub fn describe(&self) -> Vec<String> {
    self.records.iter().map(ActionRecord::label).collect()
  }

  /// Run every compensation, newest first.
  ///
  /// A failing compensation is logged and the unwind carries on; the chain is
  /// empty afterwards so it cannot be unwound twice.
  pub fn rollback(&mut self) -> FlowResult<()> {
    if self.records.is_empty() {
      return Ok(());
    }

    println!("↩️  Rolling back {} step(s)...", self.records.len());
    let mut failures = 0;

    for record in self.records.drain(..).rev() {
      let label = record.label();
      tracing::info!(step = %label, "rolling back");
      match record.action.rollback() {
        Ok(()) => println!("   ↩️  {}", label),
        Err(e) => {
          failures += 1;
          tracing::error!(step = %label, error = %e, "compensation failed");
          eprintln!("   ❌ {}: {}", label, e);
        }
      }
    }

    if failures > 0 {
      return Err(FlowError::RollbackFailed { failures, cause: None });
    }
    Ok(())
  }

  /// Unwind if `result` is an error, then hand the error back.
  ///
  /// When the unwind itself fails the original error travels as the cause of
  /// the rollback failure.
  pub fn rollback_on_error<T>(&mut self, result: FlowResult<T>) -> FlowResult<T> {
    let error = match result {
      Ok(value) => return Ok(value),
      Err(e) => e,
    };

    tracing::debug!(error = %error, pending = ?self.describe(), "workflow failed, unwinding");
    match self.rollback() {
      Ok(()) => Err(error),
      Err(FlowError::RollbackFailed { failures, .. }) => Err(FlowError::RollbackFailed {
        failures,
        cause: Some(Box::new(error)),
      }),
      Err(other) => Err(other),
    }
  }

  /// Run a workflow body against a fresh chain.
  ///
  /// The outcome is inspected only once the body has returned, so a failure
  /// in any later step still unwinds everything registered before it. On
  /// success the chain is discarded.
  pub fn run<T>(body: impl FnOnce(&mut ActionChain) -> FlowResult<T>) -> FlowResult<T> {
    let mut chain = ActionChain::new();
    let result = body(&mut chain);
    chain.rollback_on_error(result)
  }
}
