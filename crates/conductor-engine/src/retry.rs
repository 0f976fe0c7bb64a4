//! The retry boundary: one subtask, every attempt its policy allows.

use std::sync::Arc;
use std::time::{Duration, Instant};

use conductor_plan::{Subtask, SubtaskResult, SubtaskStatus, TaskOutput};
use conductor_worker::{Worker, WorkerRequest};
use tracing::{debug, instrument, warn};

use crate::error::EngineError;
use crate::events::{ExecutionEvent, ExecutionNotifier};

/// Run one worker call under `timeout`.
///
/// The call runs on its own task. When the timeout fires the task is left
/// running and its result is discarded.
pub async fn delegate_to_worker(
  worker: Arc<dyn Worker>,
  request: WorkerRequest,
  timeout: Duration,
) -> Result<TaskOutput, EngineError> {
  let timeout_ms = request.timeout_ms;
  let handle = tokio::spawn(async move { worker.delegate(request).await });

  match tokio::time::timeout(timeout, handle).await {
    Ok(Ok(result)) => result.map_err(EngineError::from),
    Ok(Err(e)) => Err(EngineError::Join {
      message: e.to_string(),
    }),
    Err(_) => Err(EngineError::Timeout { timeout_ms }),
  }
}

/// Drive `subtask` to `succeeded` or `failed`.
///
/// Attempts up to `retry_policy.attempts()` times, sleeping the policy's
/// backoff between attempts. Leaves the terminal status and result on the
/// subtask and returns a copy of the result.
#[instrument(
  skip_all,
  fields(subtask_id = %subtask.id, worker = %subtask.assigned_worker)
)]
pub async fn execute_with_retry<N>(
  worker: &Arc<dyn Worker>,
  notifier: &N,
  plan_id: &str,
  subtask: &mut Subtask,
) -> SubtaskResult
where
  N: ExecutionNotifier + ?Sized,
{
  let attempts = subtask.retry_policy.attempts();
  let backoffs = subtask.retry_policy.backoff_schedule();
  let mut last_error = String::new();

  for attempt in 1..=attempts {
    subtask.status = SubtaskStatus::Running;
    notifier.notify(ExecutionEvent::SubtaskStarted {
      plan_id: plan_id.to_string(),
      subtask_id: subtask.id.clone(),
      worker_id: subtask.assigned_worker.clone(),
      attempt,
    });

    let started = Instant::now();
    let outcome = delegate_to_worker(
      worker.clone(),
      WorkerRequest::for_subtask(subtask),
      subtask.timeout(),
    )
    .await;

    match outcome {
      Ok(output) => {
        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(attempt, duration_ms, "attempt_succeeded");

        let result = SubtaskResult::succeeded(output, duration_ms, attempt);
        subtask.status = SubtaskStatus::Succeeded;
        subtask.result = Some(result.clone());
        notifier.notify(ExecutionEvent::SubtaskSucceeded {
          plan_id: plan_id.to_string(),
          subtask_id: subtask.id.clone(),
          attempt,
          duration_ms,
        });
        return result;
      }
      Err(e) => {
        last_error = e.to_string();
        warn!(attempt, error = %last_error, "attempt_failed");

        if let Some(backoff) = backoffs.get(attempt as usize - 1) {
          notifier.notify(ExecutionEvent::SubtaskRetrying {
            plan_id: plan_id.to_string(),
            subtask_id: subtask.id.clone(),
            attempt,
            backoff_ms: backoff.as_millis() as u64,
            error: last_error.clone(),
          });
          tokio::time::sleep(*backoff).await;
        }
      }
    }
  }

  let result = SubtaskResult::failed(attempts, &last_error);
  subtask.status = SubtaskStatus::Failed;
  subtask.result = Some(result.clone());
  notifier.notify(ExecutionEvent::SubtaskFailed {
    plan_id: plan_id.to_string(),
    subtask_id: subtask.id.clone(),
    attempts,
    error: last_error,
  });
  result
}
