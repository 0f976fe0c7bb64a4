//! Goal decomposition for conductor.
//!
//! [`TaskDecomposer`] turns a goal and its free-text requirements into
//! subtasks ready for [`conductor_plan::OrchestrationPlan::build`]:
//!
//! 1. each requirement is routed to a worker through a [`WorkerRegistry`]
//! 2. a brief is rendered from the goal, matching context artifacts,
//!    standing constraints and a deliverable instruction
//! 3. dependencies on earlier requirements come from a
//!    [`DependencyInference`] strategy ([`KeywordInference`] by default)
//!    merged with any dependencies the requirement declares itself
//!
//! Decomposition only looks backwards, so it cannot introduce a cycle. Plan
//! building still checks, since callers may edit dependencies in between.

mod brief;
mod decomposer;
mod error;
mod inference;
mod registry;
mod text;

pub use brief::{BriefArtifact, BriefContext, BriefRenderer, DEFAULT_BRIEF_TEMPLATE};
pub use decomposer::TaskDecomposer;
pub use error::DecomposeError;
pub use inference::{DependencyInference, ExplicitInference, KeywordInference};
pub use registry::WorkerRegistry;
