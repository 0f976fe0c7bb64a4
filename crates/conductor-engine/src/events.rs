//! Execution events and notifiers for observability.
//!
//! Events are emitted while a plan runs so that callers can observe
//! progress, stream it to a terminal, persist it, etc.

use conductor_plan::ExecutionMode;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Events emitted during plan execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  PlanStarted {
    plan_id: String,
    goal: String,
    phases: usize,
    subtasks: usize,
  },

  PhaseStarted {
    plan_id: String,
    phase_id: u32,
    mode: ExecutionMode,
    subtask_ids: Vec<String>,
  },

  /// An attempt was dispatched to a worker.
  SubtaskStarted {
    plan_id: String,
    subtask_id: String,
    worker_id: String,
    attempt: u32,
  },

  /// An attempt failed and another one follows after `backoff_ms`.
  SubtaskRetrying {
    plan_id: String,
    subtask_id: String,
    attempt: u32,
    backoff_ms: u64,
    error: String,
  },

  SubtaskSucceeded {
    plan_id: String,
    subtask_id: String,
    attempt: u32,
    duration_ms: u64,
  },

  /// Every attempt failed.
  SubtaskFailed {
    plan_id: String,
    subtask_id: String,
    attempts: u32,
    error: String,
  },

  SubtaskSkipped {
    plan_id: String,
    subtask_id: String,
    reason: String,
  },

  PhaseCompleted {
    plan_id: String,
    phase_id: u32,
    succeeded: usize,
    failed: usize,
    skipped: usize,
  },

  PlanCompleted {
    plan_id: String,
    success: bool,
    duration_ms: u64,
  },
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` from the coordinator and from pool slots, so
/// implementations must be cheap and must not block.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

/// A notifier that turns events into `tracing` records.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl ExecutionNotifier for LogNotifier {
  fn notify(&self, event: ExecutionEvent) {
    match event {
      ExecutionEvent::PlanStarted {
        plan_id,
        goal,
        phases,
        subtasks,
      } => info!(%plan_id, %goal, phases, subtasks, "plan_started"),
      ExecutionEvent::PhaseStarted {
        plan_id,
        phase_id,
        mode,
        subtask_ids,
      } => info!(%plan_id, phase_id, ?mode, subtasks = ?subtask_ids, "phase_started"),
      ExecutionEvent::SubtaskStarted {
        plan_id,
        subtask_id,
        worker_id,
        attempt,
      } => info!(%plan_id, %subtask_id, %worker_id, attempt, "subtask_started"),
      ExecutionEvent::SubtaskRetrying {
        plan_id,
        subtask_id,
        attempt,
        backoff_ms,
        error,
      } => warn!(%plan_id, %subtask_id, attempt, backoff_ms, %error, "subtask_retrying"),
      ExecutionEvent::SubtaskSucceeded {
        plan_id,
        subtask_id,
        attempt,
        duration_ms,
      } => info!(%plan_id, %subtask_id, attempt, duration_ms, "subtask_succeeded"),
      ExecutionEvent::SubtaskFailed {
        plan_id,
        subtask_id,
        attempts,
        error,
      } => warn!(%plan_id, %subtask_id, attempts, %error, "subtask_failed"),
      ExecutionEvent::SubtaskSkipped {
        plan_id,
        subtask_id,
        reason,
      } => warn!(%plan_id, %subtask_id, %reason, "subtask_skipped"),
      ExecutionEvent::PhaseCompleted {
        plan_id,
        phase_id,
        succeeded,
        failed,
        skipped,
      } => info!(%plan_id, phase_id, succeeded, failed, skipped, "phase_completed"),
      ExecutionEvent::PlanCompleted {
        plan_id,
        success,
        duration_ms,
      } => info!(%plan_id, success, duration_ms, "plan_completed"),
    }
  }
}
