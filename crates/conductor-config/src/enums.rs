use serde::{Deserialize, Serialize};

/// How a dependent subtask relates to its upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
  /// Consumes the upstream's output.
  Data,
  /// Must run after the upstream but does not read its output.
  Ordering,
  /// Beneficial ordering only. Never blocks on upstream failure.
  Soft,
}

impl DependencyKind {
  /// Hard dependencies cause the dependent to be skipped when the upstream fails.
  pub fn is_hard(self) -> bool {
    !matches!(self, DependencyKind::Soft)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
  Sequential,
  Parallel,
}
