use conductor_worker::WorkerError;
use thiserror::Error;

/// Why a single attempt failed.
///
/// Attempt errors are contained by the retry loop and end up as text in a
/// failed [`conductor_plan::SubtaskResult`]; they never escape `execute`.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  #[error(transparent)]
  Worker(#[from] WorkerError),

  /// The spawned worker call panicked or was aborted.
  #[error("worker task failed: {message}")]
  Join { message: String },
}
