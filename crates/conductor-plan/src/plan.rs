use std::collections::HashSet;

use chrono::{DateTime, Utc};
use conductor_config::ExecutionMode;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::PlanError;
use crate::graph::DependencyGraph;
use crate::subtask::{Subtask, SubtaskResult, SubtaskStatus};

/// A set of subtasks whose dependencies all resolve in earlier phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPhase {
  pub id: u32,
  pub subtask_ids: Vec<String>,
  pub mode: ExecutionMode,
}

impl ExecutionPhase {
  fn new(id: u32, subtask_ids: Vec<String>) -> Self {
    let mode = if subtask_ids.len() > 1 {
      ExecutionMode::Parallel
    } else {
      ExecutionMode::Sequential
    };
    Self {
      id,
      subtask_ids,
      mode,
    }
  }
}

/// A validated plan ready for execution.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationPlan {
  plan_id: String,
  goal: String,
  phases: Vec<ExecutionPhase>,
  subtasks: IndexMap<String, Subtask>,
  created_at: DateTime<Utc>,
}

impl OrchestrationPlan {
  /// Build a plan from a finalized subtask set.
  ///
  /// Validates ids and dependency references, then partitions the subtasks
  /// into phases. Every subtask starts out `pending` with no result.
  pub fn build(goal: impl Into<String>, subtasks: Vec<Subtask>) -> Result<Self, PlanError> {
    let mut by_id: IndexMap<String, Subtask> = IndexMap::with_capacity(subtasks.len());
    for mut subtask in subtasks {
      if by_id.contains_key(&subtask.id) {
        return Err(PlanError::DuplicateSubtask { id: subtask.id });
      }
      subtask.status = SubtaskStatus::Pending;
      subtask.result = None;
      by_id.insert(subtask.id.clone(), subtask);
    }

    validate_dependencies(&by_id)?;

    let phases = graph_of(&by_id)
      .to_phases()?
      .into_iter()
      .enumerate()
      .map(|(index, ids)| ExecutionPhase::new(index as u32, ids))
      .collect();

    Ok(Self {
      plan_id: uuid::Uuid::new_v4().to_string(),
      goal: goal.into(),
      phases,
      subtasks: by_id,
      created_at: Utc::now(),
    })
  }

  pub fn plan_id(&self) -> &str {
    &self.plan_id
  }

  pub fn goal(&self) -> &str {
    &self.goal
  }

  pub fn phases(&self) -> &[ExecutionPhase] {
    &self.phases
  }

  pub fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }

  pub fn subtask(&self, id: &str) -> Option<&Subtask> {
    self.subtasks.get(id)
  }

  /// Subtasks in the order they were handed to [`OrchestrationPlan::build`].
  pub fn subtasks(&self) -> impl Iterator<Item = &Subtask> {
    self.subtasks.values()
  }

  pub fn len(&self) -> usize {
    self.subtasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.subtasks.is_empty()
  }

  /// Index of the phase holding `id`.
  pub fn phase_of(&self, id: &str) -> Option<u32> {
    self
      .phases
      .iter()
      .find(|phase| phase.subtask_ids.iter().any(|s| s == id))
      .map(|phase| phase.id)
  }

  /// Dependency edges as `(dependency, dependent)` pairs.
  pub fn edges(&self) -> Vec<(String, String)> {
    self
      .subtasks
      .values()
      .flat_map(|subtask| {
        subtask
          .depends_on
          .iter()
          .map(|dep| (dep.id.clone(), subtask.id.clone()))
      })
      .collect()
  }

  /// Rebuild the dependency graph the phases were derived from.
  pub fn graph(&self) -> DependencyGraph {
    graph_of(&self.subtasks)
  }

  /// Phase partition as plain id lists.
  pub fn phase_assignments(&self) -> Vec<Vec<String>> {
    self
      .phases
      .iter()
      .map(|phase| phase.subtask_ids.clone())
      .collect()
  }

  /// Record a terminal status and result for a subtask.
  pub fn record(&mut self, id: &str, status: SubtaskStatus, result: SubtaskResult) {
    if let Some(subtask) = self.subtasks.get_mut(id) {
      subtask.status = status;
      subtask.result = Some(result);
    }
  }

  /// Copy execution state from a detached copy of a subtask back into the plan.
  ///
  /// Only `status` and `result` are taken; structure stays as built.
  pub fn apply(&mut self, executed: &Subtask) {
    if let Some(subtask) = self.subtasks.get_mut(&executed.id) {
      subtask.status = executed.status;
      subtask.result = executed.result.clone();
    }
  }

  /// Ids of subtasks currently in `status`.
  pub fn ids_with_status(&self, status: SubtaskStatus) -> Vec<String> {
    self
      .subtasks
      .values()
      .filter(|s| s.status == status)
      .map(|s| s.id.clone())
      .collect()
  }
}

fn validate_dependencies(subtasks: &IndexMap<String, Subtask>) -> Result<(), PlanError> {
  let ids: HashSet<&str> = subtasks.keys().map(String::as_str).collect();

  for subtask in subtasks.values() {
    for dep in &subtask.depends_on {
      if dep.id == subtask.id {
        return Err(PlanError::SelfDependency {
          id: subtask.id.clone(),
        });
      }
      if !ids.contains(dep.id.as_str()) {
        return Err(PlanError::UnknownDependency {
          subtask_id: subtask.id.clone(),
          dependency_id: dep.id.clone(),
        });
      }
    }
  }

  Ok(())
}

// Soft edges are included: they order phases but never cause skips.
fn graph_of(subtasks: &IndexMap<String, Subtask>) -> DependencyGraph {
  let mut graph = DependencyGraph::new();
  for id in subtasks.keys() {
    graph.add_node(id);
  }
  for subtask in subtasks.values() {
    for dep in &subtask.depends_on {
      graph.add_edge(&dep.id, &subtask.id);
    }
  }
  graph
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subtask::TaskOutput;
  use conductor_config::DependencyKind;

  fn chain() -> Vec<Subtask> {
    vec![
      Subtask::new("task-1", "Design REST API for users", "architect"),
      Subtask::new("task-2", "Implement backend", "backend-engineer")
        .depends_on("task-1", DependencyKind::Data),
      Subtask::new("task-3", "Write tests", "test-engineer")
        .depends_on("task-2", DependencyKind::Soft),
    ]
  }

  #[test]
  fn test_build_chain_plan() {
    let plan = OrchestrationPlan::build("Ship users", chain()).unwrap();

    assert_eq!(plan.goal(), "Ship users");
    assert_eq!(plan.phases().len(), 3);
    for (index, phase) in plan.phases().iter().enumerate() {
      assert_eq!(phase.id, index as u32);
      assert_eq!(phase.mode, ExecutionMode::Sequential);
      assert_eq!(phase.subtask_ids.len(), 1);
    }
    assert_eq!(plan.phase_of("task-3"), Some(2));
    assert!(plan.subtasks().all(|s| s.status == SubtaskStatus::Pending));
  }

  #[test]
  fn test_build_stamps_creation_time() {
    let before = Utc::now();
    let plan = OrchestrationPlan::build("Ship users", chain()).unwrap();
    let after = Utc::now();

    assert!(before <= plan.created_at() && plan.created_at() <= after);
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["created_at"], serde_json::json!(plan.created_at()));
  }

  #[test]
  fn test_independent_subtasks_share_parallel_phase() {
    let plan = OrchestrationPlan::build(
      "Two things",
      vec![
        Subtask::new("a", "Write docs", "technical-writer"),
        Subtask::new("b", "Deploy cluster", "devops-engineer"),
      ],
    )
    .unwrap();

    assert_eq!(plan.phases().len(), 1);
    assert_eq!(plan.phases()[0].mode, ExecutionMode::Parallel);
    assert_eq!(plan.phases()[0].subtask_ids, vec!["a", "b"]);
  }

  #[test]
  fn test_build_resets_execution_state() {
    let mut subtask = Subtask::new("a", "A", "generalist");
    subtask.status = SubtaskStatus::Failed;
    subtask.result = Some(SubtaskResult::skipped("stale"));

    let plan = OrchestrationPlan::build("goal", vec![subtask]).unwrap();
    let a = plan.subtask("a").unwrap();
    assert_eq!(a.status, SubtaskStatus::Pending);
    assert!(a.result.is_none());
  }

  #[test]
  fn test_build_rejects_duplicate_ids() {
    let result = OrchestrationPlan::build(
      "goal",
      vec![Subtask::new("a", "A", "w"), Subtask::new("a", "B", "w")],
    );
    assert_eq!(
      result.err(),
      Some(PlanError::DuplicateSubtask {
        id: "a".to_string()
      })
    );
  }

  #[test]
  fn test_build_rejects_unknown_dependency() {
    let result = OrchestrationPlan::build(
      "goal",
      vec![Subtask::new("a", "A", "w").depends_on("ghost", DependencyKind::Data)],
    );
    assert!(matches!(result, Err(PlanError::UnknownDependency { .. })));
  }

  #[test]
  fn test_build_rejects_self_dependency() {
    let result = OrchestrationPlan::build(
      "goal",
      vec![Subtask::new("a", "A", "w").depends_on("a", DependencyKind::Ordering)],
    );
    assert!(matches!(result, Err(PlanError::SelfDependency { .. })));
  }

  #[test]
  fn test_build_rejects_hand_edited_cycle() {
    let result = OrchestrationPlan::build(
      "goal",
      vec![
        Subtask::new("a", "A", "w").depends_on("c", DependencyKind::Soft),
        Subtask::new("b", "B", "w").depends_on("a", DependencyKind::Data),
        Subtask::new("c", "C", "w").depends_on("b", DependencyKind::Ordering),
      ],
    );
    assert_eq!(
      result.err(),
      Some(PlanError::Cycle {
        nodes: vec!["a".to_string(), "b".to_string(), "c".to_string()]
      })
    );
  }

  #[test]
  fn test_phase_assignments_round_trip() {
    let plan = OrchestrationPlan::build(
      "goal",
      vec![
        Subtask::new("a", "A", "w"),
        Subtask::new("b", "B", "w"),
        Subtask::new("c", "C", "w").depends_on("a", DependencyKind::Data),
        Subtask::new("d", "D", "w")
          .depends_on("b", DependencyKind::Ordering)
          .depends_on("c", DependencyKind::Soft),
      ],
    )
    .unwrap();

    let serialized = serde_json::to_string(&plan.phase_assignments()).unwrap();
    let restored: Vec<Vec<String>> = serde_json::from_str(&serialized).unwrap();

    let edges = plan.edges();
    let rebuilt = DependencyGraph::from_edges(
      plan.subtasks().map(|s| s.id.as_str()),
      edges.iter().map(|(from, to)| (from.as_str(), to.as_str())),
    )
    .to_phases()
    .unwrap();

    assert_eq!(restored, rebuilt);
    assert_eq!(rebuilt, plan.graph().to_phases().unwrap());
  }

  #[test]
  fn test_apply_copies_only_execution_state() {
    let mut plan = OrchestrationPlan::build("goal", chain()).unwrap();

    let mut detached = plan.subtask("task-1").unwrap().clone();
    detached.status = SubtaskStatus::Succeeded;
    detached.result = Some(SubtaskResult::succeeded(
      TaskOutput::Text("ok".to_string()),
      12,
      1,
    ));
    detached.depends_on.clear();
    detached.name = "renamed".to_string();

    plan.apply(&detached);

    let stored = plan.subtask("task-1").unwrap();
    assert_eq!(stored.status, SubtaskStatus::Succeeded);
    assert_eq!(stored.name, "Design REST API for users");
    assert_eq!(plan.ids_with_status(SubtaskStatus::Succeeded), vec!["task-1"]);
  }
}
