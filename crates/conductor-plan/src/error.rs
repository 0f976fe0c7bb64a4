use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
  /// Kahn's algorithm left nodes unresolved.
  #[error("dependency cycle detected among: {}", nodes.join(", "))]
  Cycle { nodes: Vec<String> },

  #[error("duplicate subtask id: {id}")]
  DuplicateSubtask { id: String },

  #[error("subtask '{subtask_id}' depends on unknown subtask '{dependency_id}'")]
  UnknownDependency {
    subtask_id: String,
    dependency_id: String,
  },

  #[error("subtask '{id}' depends on itself")]
  SelfDependency { id: String },
}
