use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy for a single subtask.
///
/// The first retry waits `initial_backoff_ms`, each following wait is the
/// previous one multiplied by `backoff_multiplier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub initial_backoff_ms: u64,
  pub backoff_multiplier: f64,
}

impl RetryPolicy {
  /// A policy that never retries.
  pub fn none() -> Self {
    Self {
      max_attempts: 1,
      initial_backoff_ms: 0,
      backoff_multiplier: 1.0,
    }
  }

  /// Attempts actually made, never less than one.
  pub fn attempts(&self) -> u32 {
    self.max_attempts.max(1)
  }

  /// Sleeps taken between attempts when every attempt fails.
  pub fn backoff_schedule(&self) -> Vec<Duration> {
    let mut delays = Vec::new();
    let mut backoff = self.initial_backoff_ms as f64;
    for _ in 1..self.attempts() {
      delays.push(Duration::from_millis(backoff.round() as u64));
      backoff *= self.backoff_multiplier;
    }
    delays
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      initial_backoff_ms: 1_000,
      backoff_multiplier: 2.0,
    }
  }
}
