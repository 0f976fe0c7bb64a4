use async_trait::async_trait;
use conductor_plan::{Subtask, TaskOutput};
use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// Input handed to a worker for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
  pub subtask_id: String,
  pub worker_id: String,
  pub brief: String,
  pub timeout_ms: u64,
}

impl WorkerRequest {
  pub fn for_subtask(subtask: &Subtask) -> Self {
    Self {
      subtask_id: subtask.id.clone(),
      worker_id: subtask.assigned_worker.clone(),
      brief: subtask.brief.clone(),
      timeout_ms: subtask.timeout_ms,
    }
  }
}

/// The single external-collaborator boundary.
///
/// Implementations should return before `timeout_ms` elapses. The engine
/// enforces the timeout regardless and treats expiry as a failed attempt.
#[async_trait]
pub trait Worker: Send + Sync {
  async fn delegate(&self, request: WorkerRequest) -> Result<TaskOutput, WorkerError>;
}

