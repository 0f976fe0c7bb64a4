use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::enums::DependencyKind;
use crate::error::ConfigError;

/// A goal file: the objective, its requirements and any context artifacts.
///
/// ```json
/// {
///   "goal": "Ship a user service",
///   "requirements": [
///     "Design REST API for users",
///     { "text": "Write tests for the backend", "depends_on": [{ "index": 0, "kind": "ordering" }] }
///   ],
///   "context_artifacts": [{ "path": "docs/api-guidelines.md" }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalFile {
  pub goal: String,
  #[serde(default)]
  pub requirements: Vec<RequirementDef>,
  #[serde(default)]
  pub context_artifacts: Vec<ContextArtifact>,
}

impl GoalFile {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    crate::config::load_json(path)
  }
}

/// A requirement, either plain text or text with declared dependencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequirementDef {
  Text(String),
  Detailed {
    text: String,
    #[serde(default)]
    depends_on: Vec<DependencyDef>,
  },
}

impl RequirementDef {
  pub fn text(&self) -> &str {
    match self {
      RequirementDef::Text(text) => text,
      RequirementDef::Detailed { text, .. } => text,
    }
  }

  pub fn declared_dependencies(&self) -> &[DependencyDef] {
    match self {
      RequirementDef::Text(_) => &[],
      RequirementDef::Detailed { depends_on, .. } => depends_on,
    }
  }
}

impl From<&str> for RequirementDef {
  fn from(text: &str) -> Self {
    RequirementDef::Text(text.to_string())
  }
}

impl From<String> for RequirementDef {
  fn from(text: String) -> Self {
    RequirementDef::Text(text)
  }
}

/// A declared dependency on an earlier requirement, by 0-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDef {
  pub index: usize,
  pub kind: DependencyKind,
}

/// A file or named artifact that may be attached to briefs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextArtifact {
  pub path: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
}

impl ContextArtifact {
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      name: None,
      summary: None,
    }
  }

  /// Display name: the explicit name, else the path.
  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or(&self.path)
  }
}
