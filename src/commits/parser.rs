//! Commit-log parser
//!
//! Parses the output of `git log --source --pretty=fuller --date=iso-strict`
//! (and `git show` with the same flags) into [`Commit`] records:
//!
//! ```text
//! commit 5d1f0c9e... refs/heads/develop
//! Merge: 1a2b3c4 5d6e7f8            (optional)
//! Author:     Jane Doe <jane@example.com>
//! AuthorDate: 2024-03-01T10:00:00+01:00
//! Commit:     Jane Doe <jane@example.com>
//! CommitDate: 2024-03-01T10:00:00+01:00
//!
//!     Title line
//!
//!     Body line
//!     Change-Id: I8f2c...
//!     Story-Id: ABC-1
//!
//! diff --git a/... b/...            (show output only)
//! ```
//!
//! Every line is classified first, then fed through [`TRANSITIONS`]. A line
//! whose class has no row for the current state is a parse error, so the
//! accepted input of each state is exactly what the table declares.

use super::{CHANGE_ID_TAG, Commit, Identity, STORY_ID_TAG};
use crate::core::error::{FlowError, FlowResult, ParseError};
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^commit ([0-9a-f]{7,64})(?:\s+(\S.*?))?\s*$").unwrap());
static MERGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Merge:\s+(\S.*?)\s*$").unwrap());
static AUTHOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Author:\s+(.*)$").unwrap());
static AUTHOR_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^AuthorDate:\s+(.*)$").unwrap());
static COMMITTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Commit:\s+(.*)$").unwrap());
static COMMIT_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^CommitDate:\s+(.*)$").unwrap());
static IDENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*?)\s*<([^<>]*)>\s*$").unwrap());
static CHANGE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^change-id:\s*(\S+)\s*$").unwrap());
static STORY_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^story-id:\s*(\S+)\s*$").unwrap());

/// Parser states, named after what the state expects to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Head,
  Merge,
  Author,
  AuthorDate,
  Committer,
  CommitDate,
  Title,
  Body,
  Diff,
}

/// Context-free classification of a single input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
  Header,
  Merge,
  Author,
  AuthorDate,
  Committer,
  CommitDate,
  Blank,
  Indented,
  Other,
}

impl fmt::Display for LineClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      LineClass::Header => "commit header",
      LineClass::Merge => "Merge line",
      LineClass::Author => "Author line",
      LineClass::AuthorDate => "AuthorDate line",
      LineClass::Committer => "Commit line",
      LineClass::CommitDate => "CommitDate line",
      LineClass::Blank => "blank line",
      LineClass::Indented => "indented message line",
      LineClass::Other => "unindented text",
    };
    f.write_str(name)
  }
}

/// What to do with the line that triggered a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
  Skip,
  Begin,
  FinishAndBegin,
  SetMerge,
  SetAuthor,
  SetAuthorDate,
  SetCommitter,
  SetCommitDate,
  SetTitle,
  PushBody,
}

struct Transition {
  from: State,
  on: LineClass,
  to: State,
  step: Step,
}

const fn t(from: State, on: LineClass, to: State, step: Step) -> Transition {
  Transition { from, on, to, step }
}

/// The complete grammar. Anything missing from this table is rejected.
const TRANSITIONS: &[Transition] = &[
  t(State::Head, LineClass::Blank, State::Head, Step::Skip),
  t(State::Head, LineClass::Header, State::Merge, Step::Begin),
  t(State::Merge, LineClass::Merge, State::Author, Step::SetMerge),
  // No Merge line: fall through to Author
  t(State::Merge, LineClass::Author, State::AuthorDate, Step::SetAuthor),
  t(State::Author, LineClass::Author, State::AuthorDate, Step::SetAuthor),
  t(State::AuthorDate, LineClass::AuthorDate, State::Committer, Step::SetAuthorDate),
  t(State::Committer, LineClass::Committer, State::CommitDate, Step::SetCommitter),
  t(State::CommitDate, LineClass::CommitDate, State::Title, Step::SetCommitDate),
  t(State::Title, LineClass::Blank, State::Title, Step::Skip),
  t(State::Title, LineClass::Indented, State::Body, Step::SetTitle),
  t(State::Body, LineClass::Blank, State::Body, Step::PushBody),
  t(State::Body, LineClass::Indented, State::Body, Step::PushBody),
  t(State::Body, LineClass::Header, State::Merge, Step::FinishAndBegin),
  t(State::Body, LineClass::Other, State::Diff, Step::Skip),
  t(State::Diff, LineClass::Header, State::Merge, Step::FinishAndBegin),
  t(State::Diff, LineClass::Blank, State::Diff, Step::Skip),
  t(State::Diff, LineClass::Indented, State::Diff, Step::Skip),
  t(State::Diff, LineClass::Other, State::Diff, Step::Skip),
  t(State::Diff, LineClass::Merge, State::Diff, Step::Skip),
  t(State::Diff, LineClass::Author, State::Diff, Step::Skip),
  t(State::Diff, LineClass::AuthorDate, State::Diff, Step::Skip),
  t(State::Diff, LineClass::Committer, State::Diff, Step::Skip),
  t(State::Diff, LineClass::CommitDate, State::Diff, Step::Skip),
];

/// States in which the input may end
const ACCEPTING: &[State] = &[State::Head, State::Body, State::Diff];

fn lookup(state: State, class: LineClass) -> Option<&'static Transition> {
  TRANSITIONS.iter().find(|tr| tr.from == state && tr.on == class)
}

fn expected(state: State) -> String {
  TRANSITIONS
    .iter()
    .filter(|tr| tr.from == state)
    .map(|tr| tr.on.to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

fn classify(line: &str) -> LineClass {
  if HEADER.is_match(line) {
    LineClass::Header
  } else if MERGE.is_match(line) {
    LineClass::Merge
  } else if AUTHOR.is_match(line) {
    LineClass::Author
  } else if AUTHOR_DATE.is_match(line) {
    LineClass::AuthorDate
  } else if COMMITTER.is_match(line) {
    LineClass::Committer
  } else if COMMIT_DATE.is_match(line) {
    LineClass::CommitDate
  } else if line.trim().is_empty() {
    LineClass::Blank
  } else if line.starts_with([' ', '\t']) {
    LineClass::Indented
  } else {
    LineClass::Other
  }
}

/// Parse commit-log text into commits, oldest first.
///
/// The whole input is rejected on the first malformed line; no partial
/// result is ever returned.
pub fn parse(input: &str) -> FlowResult<Vec<Commit>> {
  let mut state = State::Head;
  let mut pending: Option<PendingCommit> = None;
  // git prints newest first; collected in that order and reversed once
  let mut commits = Vec::new();
  let mut line_no = 0;

  for (idx, raw) in input.lines().enumerate() {
    line_no = idx + 1;
    let line = raw.trim_end_matches('\r');
    let class = classify(line);

    let Some(transition) = lookup(state, class) else {
      return Err(error_at(
        line_no,
        line,
        format!("unexpected {}, expected {}", class, expected(state)),
      ));
    };

    match transition.step {
      Step::Skip => {}
      Step::Begin => pending = Some(PendingCommit::begin(line)),
      Step::FinishAndBegin => {
        if let Some(done) = pending.take() {
          commits.push(done.finish(line_no, line)?);
        }
        pending = Some(PendingCommit::begin(line));
      }
      step => {
        let current = pending
          .as_mut()
          .ok_or_else(|| error_at(line_no, line, "commit field outside of a commit".to_string()))?;
        current.apply(step, line, line_no)?;
      }
    }

    state = transition.to;
  }

  if !ACCEPTING.contains(&state) {
    return Err(error_at(
      line_no + 1,
      "",
      format!("unexpected end of input, expected {}", expected(state)),
    ));
  }
  if let Some(done) = pending.take() {
    commits.push(done.finish(line_no, "")?);
  }

  commits.reverse();
  Ok(commits)
}

fn error_at(line: usize, text: &str, reason: String) -> FlowError {
  FlowError::Parse(ParseError {
    line,
    text: text.to_string(),
    reason,
  })
}

/// Fields collected for the commit currently being read
#[derive(Debug, Default)]
struct PendingCommit {
  sha: String,
  source: String,
  merge: Option<Vec<String>>,
  author: Option<Identity>,
  author_date: Option<DateTime<FixedOffset>>,
  committer: Option<Identity>,
  commit_date: Option<DateTime<FixedOffset>>,
  title: Option<String>,
  indent: usize,
  body: Vec<String>,
  change_id: Option<String>,
  story_id: Option<String>,
}

impl PendingCommit {
  fn begin(header: &str) -> Self {
    let mut commit = PendingCommit::default();
    if let Some(caps) = HEADER.captures(header) {
      commit.sha = caps[1].to_string();
      commit.source = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
    }
    commit
  }

  fn apply(&mut self, step: Step, line: &str, line_no: usize) -> FlowResult<()> {
    match step {
      Step::SetMerge => {
        let parents = capture(&MERGE, line).unwrap_or_default();
        self.merge = Some(parents.split_whitespace().map(String::from).collect());
      }
      Step::SetAuthor => self.author = Some(parse_identity(capture(&AUTHOR, line), line, line_no)?),
      Step::SetAuthorDate => self.author_date = Some(parse_date(capture(&AUTHOR_DATE, line), line, line_no)?),
      Step::SetCommitter => self.committer = Some(parse_identity(capture(&COMMITTER, line), line, line_no)?),
      Step::SetCommitDate => self.commit_date = Some(parse_date(capture(&COMMIT_DATE, line), line, line_no)?),
      Step::SetTitle => {
        self.indent = line.len() - line.trim_start_matches([' ', '\t']).len();
        self.title = Some(line[self.indent..].trim_end().to_string());
      }
      Step::PushBody => {
        let text = self.strip_indent(line);
        self.scan_tags(&text, line, line_no)?;
        // the blank line separating title and body is not part of the body
        if !(self.body.is_empty() && text.is_empty()) {
          self.body.push(text);
        }
      }
      Step::Skip | Step::Begin | Step::FinishAndBegin => {}
    }
    Ok(())
  }

  fn strip_indent(&self, line: &str) -> String {
    if line.trim().is_empty() {
      return String::new();
    }
    let leading = line.len() - line.trim_start_matches([' ', '\t']).len();
    if leading >= self.indent {
      line[self.indent..].trim_end().to_string()
    } else {
      line.trim().to_string()
    }
  }

  fn scan_tags(&mut self, text: &str, line: &str, line_no: usize) -> FlowResult<()> {
    let trimmed = text.trim();
    let (slot, tag, caps) = if let Some(caps) = CHANGE_ID.captures(trimmed) {
      (&mut self.change_id, CHANGE_ID_TAG, caps)
    } else if let Some(caps) = STORY_ID.captures(trimmed) {
      (&mut self.story_id, STORY_ID_TAG, caps)
    } else {
      return Ok(());
    };

    if slot.is_some() {
      tracing::debug!(line = line_no, text = line, "duplicate {} tag", tag);
      return Err(FlowError::DuplicateTag {
        sha: self.sha.clone(),
        tag: tag.to_string(),
      });
    }
    *slot = Some(caps[1].to_string());
    Ok(())
  }

  fn finish(mut self, line_no: usize, line: &str) -> FlowResult<Commit> {
    while self.body.last().is_some_and(|l| l.is_empty()) {
      self.body.pop();
    }

    let missing = |field: &str| error_at(line_no, line, format!("commit {} has no {}", self.sha, field));
    Ok(Commit {
      author: self.author.clone().ok_or_else(|| missing("author"))?,
      author_date: self.author_date.ok_or_else(|| missing("author date"))?,
      committer: self.committer.clone().ok_or_else(|| missing("committer"))?,
      commit_date: self.commit_date.ok_or_else(|| missing("commit date"))?,
      title: self.title.clone().ok_or_else(|| missing("title"))?,
      sha: self.sha,
      merge: self.merge,
      body: self.body,
      change_id: self.change_id,
      story_id: self.story_id,
      source: self.source,
    })
  }
}

fn capture(re: &Regex, line: &str) -> Option<String> {
  re.captures(line).map(|caps| caps[1].trim().to_string())
}

fn parse_identity(value: Option<String>, line: &str, line_no: usize) -> FlowResult<Identity> {
  let value = value.unwrap_or_default();
  let caps = IDENTITY
    .captures(&value)
    .ok_or_else(|| error_at(line_no, line, "identity must look like 'Name <email>'".to_string()))?;
  Ok(Identity {
    name: caps[1].trim().to_string(),
    email: caps[2].trim().to_string(),
  })
}

fn parse_date(value: Option<String>, line: &str, line_no: usize) -> FlowResult<DateTime<FixedOffset>> {
  let value = value.unwrap_or_default();
  DateTime::parse_from_rfc3339(&value)
    .map_err(|e| error_at(line_no, line, format!("invalid ISO 8601 date '{}': {}", value, e)))
}
