use serde::{Deserialize, Serialize};

/// A worker and the keywords that route requirements to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerDef {
  pub id: String,
  #[serde(default)]
  pub keywords: Vec<String>,
}

impl WorkerDef {
  pub fn new(id: impl Into<String>, keywords: &[&str]) -> Self {
    Self {
      id: id.into(),
      keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
  }
}

/// Keyword table mapping worker identifiers to keyword sets.
///
/// Declaration order matters: it breaks ties between equally scored workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerRegistryDef {
  pub workers: Vec<WorkerDef>,
  /// Worker used when no keyword matches.
  pub default_worker: String,
}

impl Default for WorkerRegistryDef {
  fn default() -> Self {
    Self {
      workers: vec![
        WorkerDef::new(
          "architect",
          &["architecture", "design", "schema", "interface", "rest", "model"],
        ),
        WorkerDef::new(
          "test-engineer",
          &["test", "tests", "testing", "coverage", "qa", "verify"],
        ),
        WorkerDef::new(
          "technical-writer",
          &["docs", "documentation", "readme", "guide", "tutorial", "changelog"],
        ),
        WorkerDef::new(
          "devops-engineer",
          &["deploy", "deployment", "pipeline", "docker", "kubernetes", "ci", "infrastructure"],
        ),
        WorkerDef::new(
          "frontend-engineer",
          &["frontend", "ui", "component", "page", "css", "react", "layout"],
        ),
        WorkerDef::new(
          "backend-engineer",
          &["backend", "api", "server", "database", "endpoint", "service", "implement"],
        ),
      ],
      default_worker: "generalist".to_string(),
    }
  }
}
