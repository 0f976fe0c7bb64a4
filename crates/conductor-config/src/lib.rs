//! Conductor Config
//!
//! Serializable configuration types for conductor. These describe what the
//! orchestrator should do before anything is decomposed or planned:
//!
//! - goal files (goal, requirements, context artifacts)
//! - the worker registry used to route requirements to workers
//! - decomposer, brief and engine settings
//! - subprocess commands backing each worker
//!
//! Everything is loaded from JSON. Omitted fields fall back to defaults, so an
//! empty `{}` is a valid [`OrchestratorConfig`].

mod config;
mod enums;
mod error;
mod goal;
mod registry;
mod retry;
mod settings;
mod workers;

pub use config::OrchestratorConfig;
pub use enums::{DependencyKind, ExecutionMode};
pub use error::ConfigError;
pub use goal::{ContextArtifact, DependencyDef, GoalFile, RequirementDef};
pub use registry::{WorkerDef, WorkerRegistryDef};
pub use retry::RetryPolicy;
pub use settings::{BriefSettings, DecomposerSettings, EngineSettings};
pub use workers::{CommandDef, WorkerCommands};
