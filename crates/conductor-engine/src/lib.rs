//! Conductor Execution Engine
//!
//! Runs an [`conductor_plan::OrchestrationPlan`] phase by phase against a
//! [`conductor_worker::Worker`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ExecutionEngine                        │
//! │  - execute(plan) / execute_with_cancel(plan, cancel)        │
//! │  - phases strictly in order, skip propagation after each    │
//! │  - bounded pool of tokio tasks for parallel phases          │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    execute_with_retry                       │
//! │  - attempts per RetryPolicy, geometric backoff              │
//! │  - the only place attempts are retried                      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    delegate_to_worker                       │
//! │  - spawned worker call under the subtask timeout            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use conductor_engine::{ExecutionEngine, LogNotifier};
//!
//! let engine = ExecutionEngine::with_notifier(worker, config.engine.clone(), LogNotifier);
//! let result = engine.execute(plan).await;
//! if !result.success {
//!   eprintln!("{}", result.errors.join("\n"));
//! }
//! ```

mod engine;
mod error;
mod events;
mod result;
mod retry;

pub use engine::ExecutionEngine;
pub use error::EngineError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, LogNotifier, NoopNotifier};
pub use result::{AggregatedEntry, ExecutionSummary, OrchestrationResult, PhaseEntry};
pub use retry::{delegate_to_worker, execute_with_retry};
pub use tokio_util::sync::CancellationToken;
