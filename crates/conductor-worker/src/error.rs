//! Worker errors.

/// Errors a worker can report for a single attempt.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
  /// No command is configured for the worker and there is no fallback.
  #[error("no command configured for worker '{worker_id}'")]
  NoCommand { worker_id: String },

  /// The worker process could not be started.
  #[error("failed to spawn '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// I/O with a running worker process failed.
  #[error("worker i/o failed: {source}")]
  Io {
    #[source]
    source: std::io::Error,
  },

  /// The worker process exited unsuccessfully.
  #[error("worker process exited with {status}: {stderr}")]
  ProcessFailed { status: String, stderr: String },

  /// The worker reported a failure.
  #[error("{message}")]
  Failed { message: String },
}

impl WorkerError {
  pub fn failed(message: impl Into<String>) -> Self {
    WorkerError::Failed {
      message: message.into(),
    }
  }
}
