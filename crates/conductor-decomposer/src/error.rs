use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecomposeError {
  /// The brief template failed to parse or render.
  #[error("brief template error: {message}")]
  Template { message: String },

  /// A declared dependency does not point at an earlier requirement.
  #[error("requirement {requirement} declares dependency on index {index}, which is not an earlier requirement")]
  InvalidDependency { requirement: usize, index: usize },
}
