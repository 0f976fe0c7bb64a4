use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A subprocess that performs a worker's subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDef {
  pub program: String,
  #[serde(default)]
  pub args: Vec<String>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub working_dir: Option<PathBuf>,
}

/// Commands keyed by worker id, plus an optional fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerCommands {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default: Option<CommandDef>,
  pub commands: BTreeMap<String, CommandDef>,
}

impl WorkerCommands {
  pub fn command_for(&self, worker_id: &str) -> Option<&CommandDef> {
    self.commands.get(worker_id).or(self.default.as_ref())
  }
}
