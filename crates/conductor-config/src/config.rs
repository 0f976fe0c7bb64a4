use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::registry::WorkerRegistryDef;
use crate::settings::{BriefSettings, DecomposerSettings, EngineSettings};
use crate::workers::WorkerCommands;

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
  pub registry: WorkerRegistryDef,
  pub decomposer: DecomposerSettings,
  pub brief: BriefSettings,
  pub engine: EngineSettings,
  pub workers: WorkerCommands,
}

impl OrchestratorConfig {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    load_json(path)
  }
}

pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
    path: path.to_path_buf(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;
  use crate::{DependencyKind, GoalFile, RequirementDef};

  fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
    file
      .write_all(content.as_bytes())
      .expect("failed to write temp file");
    file
  }

  #[test]
  fn test_empty_config_uses_defaults() {
    let file = write_temp("{}");
    let config = OrchestratorConfig::load(file.path()).unwrap();

    assert_eq!(config, OrchestratorConfig::default());
    assert_eq!(config.engine.max_concurrency, 5);
    assert_eq!(config.decomposer.retry_policy.max_attempts, 3);
    assert_eq!(config.registry.default_worker, "generalist");
  }

  #[test]
  fn test_partial_config_overrides() {
    let file = write_temp(
      r#"{
        "engine": { "max_concurrency": 2 },
        "decomposer": { "retry_policy": { "max_attempts": 5 } },
        "workers": { "commands": { "architect": { "program": "cat" } } }
      }"#,
    );
    let config = OrchestratorConfig::load(file.path()).unwrap();

    assert_eq!(config.engine.max_concurrency, 2);
    assert_eq!(config.decomposer.retry_policy.max_attempts, 5);
    assert_eq!(config.decomposer.retry_policy.initial_backoff_ms, 1_000);
    assert_eq!(config.workers.command_for("architect").unwrap().program, "cat");
    assert!(config.workers.command_for("generalist").is_none());
  }

  #[test]
  fn test_goal_file_mixed_requirements() {
    let file = write_temp(
      r#"{
        "goal": "Ship a user service",
        "requirements": [
          "Design REST API for users",
          { "text": "Write tests", "depends_on": [{ "index": 0, "kind": "ordering" }] }
        ]
      }"#,
    );
    let goal = GoalFile::load(file.path()).unwrap();

    assert_eq!(goal.requirements.len(), 2);
    assert_eq!(goal.requirements[0], RequirementDef::from("Design REST API for users"));
    assert_eq!(goal.requirements[1].text(), "Write tests");
    assert_eq!(
      goal.requirements[1].declared_dependencies()[0].kind,
      DependencyKind::Ordering
    );
    assert!(goal.context_artifacts.is_empty());
  }

  #[test]
  fn test_missing_file_is_read_error() {
    let result = OrchestratorConfig::load(Path::new("/nonexistent/conductor.json"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
  }

  #[test]
  fn test_invalid_json_is_parse_error() {
    let file = write_temp("{ not json");
    let result = GoalFile::load(file.path());
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
  }
}
