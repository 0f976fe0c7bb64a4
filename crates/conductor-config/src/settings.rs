use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Defaults applied to every decomposed subtask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposerSettings {
  pub retry_policy: RetryPolicy,
  pub timeout_ms: u64,
}

impl Default for DecomposerSettings {
  fn default() -> Self {
    Self {
      retry_policy: RetryPolicy::default(),
      timeout_ms: 300_000,
    }
  }
}

/// What goes into every worker brief.
///
/// `template` overrides the built-in minijinja template. It is rendered with
/// `goal`, `requirement`, `context` (list of `{path, name, summary}`),
/// `constraints` and `deliverable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefSettings {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub template: Option<String>,
  pub constraints: Vec<String>,
  pub deliverable: String,
}

impl Default for BriefSettings {
  fn default() -> Self {
    Self {
      template: None,
      constraints: vec![
        "Stay within the scope of this subtask.".to_string(),
        "Follow the existing conventions of the codebase.".to_string(),
        "Report blockers instead of guessing.".to_string(),
      ],
      deliverable: "Return a concise summary of the work done and any artifacts produced."
        .to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
  /// Worker pool size for parallel phases.
  pub max_concurrency: usize,
}

impl Default for EngineSettings {
  fn default() -> Self {
    Self { max_concurrency: 5 }
  }
}
