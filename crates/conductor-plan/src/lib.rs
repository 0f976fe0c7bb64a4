//! Conductor Plan
//!
//! This crate provides the validated plan representation for conductor.
//! A plan is built once from a finalized set of subtasks and is ready for
//! execution:
//!
//! - Subtask ids are unique and every dependency points inside the plan
//! - The dependency relation is acyclic
//! - Subtasks are partitioned into phases with Kahn's algorithm, each phase
//!   holding the subtasks whose dependencies all live in earlier phases
//!
//! Execution only ever touches a subtask's status and result. Phase membership
//! and dependency edges are fixed at build time.

mod error;
mod graph;
mod plan;
mod subtask;

pub use conductor_config::{DependencyKind, ExecutionMode, RetryPolicy};
pub use error::PlanError;
pub use graph::DependencyGraph;
pub use plan::{ExecutionPhase, OrchestrationPlan};
pub use subtask::{Dependency, Subtask, SubtaskResult, SubtaskStatus, TaskOutput};
