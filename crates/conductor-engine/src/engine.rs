//! Phased plan execution.
//!
//! The `ExecutionEngine` runs a plan's phases strictly in order. Parallel
//! phases go through a bounded pool of tokio tasks; sequential phases run on
//! the coordinator. After every phase, pending subtasks whose hard
//! dependencies did not succeed are skipped.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use conductor_config::EngineSettings;
use conductor_plan::{
  ExecutionMode, ExecutionPhase, OrchestrationPlan, Subtask, SubtaskResult, SubtaskStatus,
};
use conductor_worker::Worker;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::{OrchestrationResult, aggregate};
use crate::retry::execute_with_retry;

const CANCELLED: &str = "execution cancelled";

/// Executes plans against a worker.
///
/// Generic over `N: ExecutionNotifier` to allow different notification
/// strategies. Use `ExecutionEngine::new()` for no-op notifications or
/// `ExecutionEngine::with_notifier()` to observe progress.
pub struct ExecutionEngine<N: ExecutionNotifier = NoopNotifier> {
  worker: Arc<dyn Worker>,
  notifier: Arc<N>,
  settings: EngineSettings,
}

impl ExecutionEngine<NoopNotifier> {
  pub fn new(worker: Arc<dyn Worker>, settings: EngineSettings) -> Self {
    Self::with_notifier(worker, settings, NoopNotifier)
  }
}

/// Bookkeeping accumulated over one run.
#[derive(Default)]
struct RunState {
  errors: Vec<String>,
  skipped: Vec<String>,
  warnings: Vec<String>,
}

impl<N: ExecutionNotifier + 'static> ExecutionEngine<N> {
  pub fn with_notifier(worker: Arc<dyn Worker>, settings: EngineSettings, notifier: N) -> Self {
    Self {
      worker,
      notifier: Arc::new(notifier),
      settings,
    }
  }

  /// Execute every phase of `plan`.
  ///
  /// Task failures never make this fail; they are reported in the result.
  pub async fn execute(&self, plan: OrchestrationPlan) -> OrchestrationResult {
    self.execute_with_cancel(plan, CancellationToken::new()).await
  }

  /// Execute `plan` until it finishes or `cancel` fires.
  ///
  /// Cancellation stops new dispatches; attempts already in flight are
  /// awaited. Whatever never ran is skipped, and only then does the run
  /// count as cancelled.
  #[instrument(name = "execute", skip_all, fields(plan_id = %plan.plan_id()))]
  pub async fn execute_with_cancel(
    &self,
    mut plan: OrchestrationPlan,
    cancel: CancellationToken,
  ) -> OrchestrationResult {
    let started = Instant::now();
    let plan_id = plan.plan_id().to_string();
    let mut state = RunState::default();

    self.notifier.notify(ExecutionEvent::PlanStarted {
      plan_id: plan_id.clone(),
      goal: plan.goal().to_string(),
      phases: plan.phases().len(),
      subtasks: plan.len(),
    });
    info!(phases = plan.phases().len(), subtasks = plan.len(), "plan_started");

    let phases: Vec<ExecutionPhase> = plan.phases().to_vec();
    for phase in &phases {
      if cancel.is_cancelled() {
        break;
      }
      self.run_phase(&mut plan, phase, &cancel, &mut state).await;
    }

    let unfinished = plan.ids_with_status(SubtaskStatus::Pending);
    if cancel.is_cancelled() && !unfinished.is_empty() {
      warn!(skipped = unfinished.len(), "execution_cancelled");
      for id in unfinished {
        self.skip(&mut plan, &id, "skipped: execution cancelled", &mut state);
      }
      state.errors.push(CANCELLED.to_string());
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    let success = state.errors.is_empty();
    self.notifier.notify(ExecutionEvent::PlanCompleted {
      plan_id,
      success,
      duration_ms,
    });
    info!(success, duration_ms, errors = state.errors.len(), "plan_completed");

    let (phase_results, aggregated) = aggregate(&plan);
    OrchestrationResult {
      plan,
      phase_results,
      aggregated,
      duration_ms,
      success,
      errors: state.errors,
      skipped: state.skipped,
      warnings: state.warnings,
    }
  }

  async fn run_phase(
    &self,
    plan: &mut OrchestrationPlan,
    phase: &ExecutionPhase,
    cancel: &CancellationToken,
    state: &mut RunState,
  ) {
    let plan_id = plan.plan_id().to_string();
    self.notifier.notify(ExecutionEvent::PhaseStarted {
      plan_id: plan_id.clone(),
      phase_id: phase.id,
      mode: phase.mode,
      subtask_ids: phase.subtask_ids.clone(),
    });

    let runnable: Vec<Subtask> = phase
      .subtask_ids
      .iter()
      .filter_map(|id| plan.subtask(id))
      .filter(|subtask| subtask.status == SubtaskStatus::Pending)
      .cloned()
      .collect();

    for subtask in &runnable {
      for dep in subtask.soft_dependencies() {
        if plan
          .subtask(&dep.id)
          .is_some_and(|upstream| did_not_succeed(upstream.status))
        {
          warn!(subtask_id = %subtask.id, dependency = %dep.id, "soft_dependency_failed");
          state.warnings.push(format!(
            "{}: soft dependency {} did not succeed",
            subtask.id, dep.id
          ));
        }
      }
    }

    let finished = match phase.mode {
      ExecutionMode::Sequential => self.run_sequential(&plan_id, runnable, cancel).await,
      ExecutionMode::Parallel => self.run_pool(plan, runnable, cancel).await,
    };

    for subtask in &finished {
      if subtask.status == SubtaskStatus::Failed {
        let message = subtask
          .result
          .as_ref()
          .and_then(|r| r.error.as_deref())
          .unwrap_or("failed");
        state.errors.push(format!("{}: {}", subtask.id, message));
      }
      plan.apply(subtask);
    }

    self.propagate_skips(plan, state);

    let count = |status: SubtaskStatus| {
      phase
        .subtask_ids
        .iter()
        .filter(|id| plan.subtask(id).is_some_and(|s| s.status == status))
        .count()
    };
    self.notifier.notify(ExecutionEvent::PhaseCompleted {
      plan_id,
      phase_id: phase.id,
      succeeded: count(SubtaskStatus::Succeeded),
      failed: count(SubtaskStatus::Failed),
      skipped: count(SubtaskStatus::Skipped),
    });
  }

  /// One at a time, in list order.
  async fn run_sequential(
    &self,
    plan_id: &str,
    runnable: Vec<Subtask>,
    cancel: &CancellationToken,
  ) -> Vec<Subtask> {
    let mut finished = Vec::with_capacity(runnable.len());
    for mut subtask in runnable {
      if cancel.is_cancelled() {
        break;
      }
      subtask.status = SubtaskStatus::Ready;
      execute_with_retry(&self.worker, self.notifier.as_ref(), plan_id, &mut subtask).await;
      finished.push(subtask);
    }
    finished
  }

  /// Bounded pool: `min(max_concurrency, n)` slots pulling from a shared queue.
  ///
  /// Slots own the subtasks they claim and hand them back when the queue is
  /// drained. A slot that panics loses the subtask it was holding; that one
  /// is failed and fresh slots pick up whatever is still queued.
  async fn run_pool(
    &self,
    plan: &OrchestrationPlan,
    runnable: Vec<Subtask>,
    cancel: &CancellationToken,
  ) -> Vec<Subtask> {
    let plan_id = plan.plan_id();
    let mut finished = Vec::with_capacity(runnable.len());
    let queue = Arc::new(Mutex::new(VecDeque::from(runnable)));
    let claimed = Arc::new(Mutex::new(Vec::<String>::new()));

    loop {
      let queued = queue.lock().await.len();
      let slots = self.settings.max_concurrency.max(1).min(queued);
      if slots == 0 || cancel.is_cancelled() {
        break;
      }

      let handles: Vec<_> = (0..slots)
        .map(|_| {
          let queue = queue.clone();
          let claimed = claimed.clone();
          let worker = self.worker.clone();
          let notifier = self.notifier.clone();
          let cancel = cancel.clone();
          let plan_id = plan_id.to_string();

          tokio::spawn(async move {
            let mut done = Vec::new();
            loop {
              if cancel.is_cancelled() {
                break;
              }
              let next = queue.lock().await.pop_front();
              let Some(mut subtask) = next else {
                break;
              };
              claimed.lock().await.push(subtask.id.clone());
              subtask.status = SubtaskStatus::Ready;
              execute_with_retry(&worker, notifier.as_ref(), &plan_id, &mut subtask).await;
              done.push(subtask);
            }
            done
          })
        })
        .collect();

      let mut panic = None;
      for joined in futures::future::join_all(handles).await {
        match joined {
          Ok(done) => finished.extend(done),
          Err(e) => {
            error!(error = %e, "pool_slot_panicked");
            panic.get_or_insert(e.to_string());
          }
        }
      }

      let Some(message) = panic else {
        break;
      };

      let returned: HashSet<&str> = finished.iter().map(|s| s.id.as_str()).collect();
      let lost: Vec<String> = claimed
        .lock()
        .await
        .iter()
        .filter(|id| !returned.contains(id.as_str()))
        .cloned()
        .collect();
      for id in lost {
        let Some(mut subtask) = plan.subtask(&id).cloned() else {
          continue;
        };
        subtask.status = SubtaskStatus::Failed;
        subtask.result = Some(SubtaskResult {
          success: false,
          output: None,
          duration_ms: 0,
          attempt: 0,
          error: Some(format!("worker pool slot panicked: {}", message)),
        });
        finished.push(subtask);
      }
    }

    finished
  }

  /// Skip every pending subtask with a hard dependency that did not succeed.
  ///
  /// Walks subtasks in phase order, so a skip made here is seen by later
  /// dependents in the same pass.
  fn propagate_skips(&self, plan: &mut OrchestrationPlan, state: &mut RunState) {
    let order: Vec<String> = plan
      .phases()
      .iter()
      .flat_map(|phase| phase.subtask_ids.iter().cloned())
      .collect();

    for id in order {
      let Some(subtask) = plan.subtask(&id) else {
        continue;
      };
      if subtask.status != SubtaskStatus::Pending {
        continue;
      }

      let blocker = subtask
        .hard_dependencies()
        .find(|dep| {
          plan
            .subtask(&dep.id)
            .is_some_and(|upstream| did_not_succeed(upstream.status))
        })
        .map(|dep| dep.id.clone());

      if let Some(blocker) = blocker {
        let reason = format!("skipped: dependency {} did not succeed", blocker);
        self.skip(plan, &id, &reason, state);
      }
    }
  }

  fn skip(&self, plan: &mut OrchestrationPlan, id: &str, reason: &str, state: &mut RunState) {
    plan.record(id, SubtaskStatus::Skipped, SubtaskResult::skipped(reason));
    state.skipped.push(id.to_string());
    info!(subtask_id = %id, %reason, "subtask_skipped");
    self.notifier.notify(ExecutionEvent::SubtaskSkipped {
      plan_id: plan.plan_id().to_string(),
      subtask_id: id.to_string(),
      reason: reason.to_string(),
    });
  }
}

fn did_not_succeed(status: SubtaskStatus) -> bool {
  matches!(status, SubtaskStatus::Failed | SubtaskStatus::Skipped)
}
