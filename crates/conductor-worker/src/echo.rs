use async_trait::async_trait;
use conductor_plan::TaskOutput;
use tracing::debug;

use crate::error::WorkerError;
use crate::worker::{Worker, WorkerRequest};

/// A worker that returns each brief as its output.
#[derive(Debug, Clone, Default)]
pub struct EchoWorker;

#[async_trait]
impl Worker for EchoWorker {
  async fn delegate(&self, request: WorkerRequest) -> Result<TaskOutput, WorkerError> {
    debug!(
      subtask_id = %request.subtask_id,
      worker_id = %request.worker_id,
      "echo_delegate"
    );
    Ok(TaskOutput::Text(request.brief))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_echo_returns_brief() {
    let request = WorkerRequest {
      subtask_id: "task-1".to_string(),
      worker_id: "architect".to_string(),
      brief: "design it".to_string(),
      timeout_ms: 1_000,
    };

    let output = EchoWorker.delegate(request).await.unwrap();
    assert_eq!(output, TaskOutput::Text("design it".to_string()));
  }
}
