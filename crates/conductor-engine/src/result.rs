use std::collections::BTreeMap;
use std::fmt;

use conductor_plan::{OrchestrationPlan, SubtaskResult, SubtaskStatus, TaskOutput};
use serde::Serialize;

/// One subtask's outcome as listed under its phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseEntry {
  pub subtask_id: String,
  pub name: String,
  pub worker_id: String,
  pub status: SubtaskStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<SubtaskResult>,
}

/// Flattened per-subtask report, keyed by subtask name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedEntry {
  pub worker_id: String,
  /// Tells a failed subtask apart from a skipped one.
  pub status: SubtaskStatus,
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub output: Option<TaskOutput>,
  pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
  pub total: usize,
  pub succeeded: usize,
  pub failed: usize,
  pub skipped: usize,
}

impl fmt::Display for ExecutionSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} subtasks: {} succeeded, {} failed, {} skipped",
      self.total, self.succeeded, self.failed, self.skipped
    )
  }
}

/// Result of executing a plan.
#[derive(Debug, Serialize)]
pub struct OrchestrationResult {
  /// The plan with every subtask's final status and result.
  pub plan: OrchestrationPlan,
  pub phase_results: BTreeMap<u32, Vec<PhaseEntry>>,
  pub aggregated: BTreeMap<String, AggregatedEntry>,
  pub duration_ms: u64,
  /// True iff `errors` is empty.
  pub success: bool,
  pub errors: Vec<String>,
  /// Ids of subtasks that were never dispatched.
  pub skipped: Vec<String>,
  /// Soft dependencies that did not succeed while their dependent still ran.
  pub warnings: Vec<String>,
}

impl OrchestrationResult {
  pub fn summary(&self) -> ExecutionSummary {
    let mut summary = ExecutionSummary {
      total: self.plan.len(),
      ..ExecutionSummary::default()
    };
    for subtask in self.plan.subtasks() {
      match subtask.status {
        SubtaskStatus::Succeeded => summary.succeeded += 1,
        SubtaskStatus::Failed => summary.failed += 1,
        SubtaskStatus::Skipped => summary.skipped += 1,
        _ => {}
      }
    }
    summary
  }

  pub fn result_of(&self, subtask_id: &str) -> Option<&SubtaskResult> {
    self
      .plan
      .subtask(subtask_id)
      .and_then(|subtask| subtask.result.as_ref())
  }

  pub fn status_of(&self, subtask_id: &str) -> Option<SubtaskStatus> {
    self.plan.subtask(subtask_id).map(|subtask| subtask.status)
  }
}

/// Group outcomes by phase and flatten them by subtask name.
///
/// Names are not unique; a later phase overwrites an earlier entry.
pub(crate) fn aggregate(
  plan: &OrchestrationPlan,
) -> (
  BTreeMap<u32, Vec<PhaseEntry>>,
  BTreeMap<String, AggregatedEntry>,
) {
  let mut phase_results = BTreeMap::new();
  let mut aggregated = BTreeMap::new();

  for phase in plan.phases() {
    let mut entries = Vec::with_capacity(phase.subtask_ids.len());
    for subtask in phase.subtask_ids.iter().filter_map(|id| plan.subtask(id)) {
      let result = subtask.result.as_ref();
      aggregated.insert(
        subtask.name.clone(),
        AggregatedEntry {
          worker_id: subtask.assigned_worker.clone(),
          status: subtask.status,
          success: result.is_some_and(|r| r.success),
          output: result.and_then(|r| r.output.clone()),
          duration_ms: result.map_or(0, |r| r.duration_ms),
        },
      );
      entries.push(PhaseEntry {
        subtask_id: subtask.id.clone(),
        name: subtask.name.clone(),
        worker_id: subtask.assigned_worker.clone(),
        status: subtask.status,
        result: subtask.result.clone(),
      });
    }
    phase_results.insert(phase.id, entries);
  }

  (phase_results, aggregated)
}

#[cfg(test)]
mod tests {
  use conductor_plan::{DependencyKind, Subtask};

  use super::*;

  #[test]
  fn test_aggregate_duplicate_names_keep_latest() {
    let mut plan = OrchestrationPlan::build(
      "goal",
      vec![
        Subtask::new("a", "Same name", "architect"),
        Subtask::new("b", "Same name", "test-engineer").depends_on("a", DependencyKind::Data),
      ],
    )
    .unwrap();
    plan.record(
      "a",
      SubtaskStatus::Succeeded,
      SubtaskResult::succeeded(TaskOutput::Text("first".to_string()), 5, 1),
    );
    plan.record(
      "b",
      SubtaskStatus::Failed,
      SubtaskResult::failed(1, "nope"),
    );

    let (phases, aggregated) = aggregate(&plan);

    assert_eq!(phases.len(), 2);
    assert_eq!(phases[&0][0].subtask_id, "a");
    assert_eq!(phases[&1][0].status, SubtaskStatus::Failed);

    assert_eq!(aggregated.len(), 1);
    let entry = &aggregated["Same name"];
    assert_eq!(entry.worker_id, "test-engineer");
    assert_eq!(entry.status, SubtaskStatus::Failed);
    assert!(!entry.success);
    assert!(entry.output.is_none());
  }
}
