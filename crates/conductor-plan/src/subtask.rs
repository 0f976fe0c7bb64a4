use std::fmt;
use std::time::Duration;

use conductor_config::{DependencyKind, RetryPolicy};
use serde::{Deserialize, Serialize};

/// Output produced by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TaskOutput {
  Text(String),
  Json(serde_json::Value),
}

impl TaskOutput {
  pub fn as_text(&self) -> Option<&str> {
    match self {
      TaskOutput::Text(text) => Some(text),
      TaskOutput::Json(_) => None,
    }
  }

  pub fn as_json(&self) -> Option<&serde_json::Value> {
    match self {
      TaskOutput::Text(_) => None,
      TaskOutput::Json(value) => Some(value),
    }
  }
}

impl fmt::Display for TaskOutput {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TaskOutput::Text(text) => f.write_str(text),
      TaskOutput::Json(value) => write!(f, "{}", value),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskStatus {
  Pending,
  /// Set immediately before dispatch.
  Ready,
  Running,
  Succeeded,
  Failed,
  /// Never dispatched because an upstream hard dependency did not succeed.
  Skipped,
}

impl SubtaskStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      SubtaskStatus::Pending => "pending",
      SubtaskStatus::Ready => "ready",
      SubtaskStatus::Running => "running",
      SubtaskStatus::Succeeded => "succeeded",
      SubtaskStatus::Failed => "failed",
      SubtaskStatus::Skipped => "skipped",
    }
  }
}

impl fmt::Display for SubtaskStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Terminal outcome of a subtask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskResult {
  pub success: bool,
  pub output: Option<TaskOutput>,
  pub duration_ms: u64,
  /// Attempt that produced this result. Zero for skipped subtasks.
  pub attempt: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl SubtaskResult {
  pub fn succeeded(output: TaskOutput, duration_ms: u64, attempt: u32) -> Self {
    Self {
      success: true,
      output: Some(output),
      duration_ms,
      attempt,
      error: None,
    }
  }

  pub fn failed(attempts: u32, last_error: &str) -> Self {
    Self {
      success: false,
      output: None,
      duration_ms: 0,
      attempt: attempts,
      error: Some(format!("Failed after {} attempts: {}", attempts, last_error)),
    }
  }

  pub fn skipped(reason: impl Into<String>) -> Self {
    Self {
      success: false,
      output: None,
      duration_ms: 0,
      attempt: 0,
      error: Some(reason.into()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
  pub id: String,
  pub kind: DependencyKind,
}

/// A unit of work routed to a single worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
  pub id: String,
  pub name: String,
  pub assigned_worker: String,
  pub brief: String,
  #[serde(default)]
  pub depends_on: Vec<Dependency>,
  #[serde(default)]
  pub retry_policy: RetryPolicy,
  pub timeout_ms: u64,
  pub status: SubtaskStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<SubtaskResult>,
}

impl Subtask {
  pub fn new(
    id: impl Into<String>,
    name: impl Into<String>,
    assigned_worker: impl Into<String>,
  ) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      assigned_worker: assigned_worker.into(),
      brief: String::new(),
      depends_on: Vec::new(),
      retry_policy: RetryPolicy::default(),
      timeout_ms: 300_000,
      status: SubtaskStatus::Pending,
      result: None,
    }
  }

  pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
    self.brief = brief.into();
    self
  }

  pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
    self.retry_policy = retry_policy;
    self
  }

  pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
    self.timeout_ms = timeout_ms;
    self
  }

  pub fn depends_on(mut self, id: impl Into<String>, kind: DependencyKind) -> Self {
    self.add_dependency(id, kind);
    self
  }

  /// Record a dependency. Returns false if `id` was already a dependency.
  pub fn add_dependency(&mut self, id: impl Into<String>, kind: DependencyKind) -> bool {
    let id = id.into();
    if self.depends_on.iter().any(|d| d.id == id) {
      return false;
    }
    self.depends_on.push(Dependency { id, kind });
    true
  }

  pub fn dependency_kind(&self, id: &str) -> Option<DependencyKind> {
    self
      .depends_on
      .iter()
      .find(|d| d.id == id)
      .map(|d| d.kind)
  }

  pub fn hard_dependencies(&self) -> impl Iterator<Item = &Dependency> {
    self.depends_on.iter().filter(|d| d.kind.is_hard())
  }

  pub fn soft_dependencies(&self) -> impl Iterator<Item = &Dependency> {
    self.depends_on.iter().filter(|d| !d.kind.is_hard())
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }
}
