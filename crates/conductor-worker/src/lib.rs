//! Worker delegation for conductor.
//!
//! A [`Worker`] is the external collaborator that performs a subtask. The
//! engine hands it a [`WorkerRequest`] (worker id, brief, timeout) and gets
//! back either a [`TaskOutput`] or a [`WorkerError`].
//!
//! Two implementations ship with the crate:
//! - [`CommandWorker`] runs a configured subprocess per worker id, writing the
//!   request as JSON to stdin and reading the output from stdout
//! - [`EchoWorker`] returns the brief unchanged, for dry runs

mod command;
mod echo;
mod error;
mod worker;

pub use command::CommandWorker;
pub use conductor_plan::TaskOutput;
pub use echo::EchoWorker;
pub use error::WorkerError;
pub use worker::{Worker, WorkerRequest};
