//! Dependency inference strategies.

use conductor_plan::{Dependency, DependencyKind, Subtask};

use crate::text::{contains_phrase, significant_words, words};

/// Infers dependencies of a requirement on subtasks decomposed before it.
///
/// `earlier` holds only subtasks produced earlier in the same decomposition,
/// so a strategy cannot create a cycle.
pub trait DependencyInference: Send + Sync {
  fn infer(&self, requirement: &str, earlier: &[Subtask]) -> Vec<Dependency>;
}

/// No inference; dependencies come only from what requirements declare.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitInference;

impl DependencyInference for ExplicitInference {
  fn infer(&self, _requirement: &str, _earlier: &[Subtask]) -> Vec<Dependency> {
    Vec::new()
  }
}

/// Shared-vocabulary heuristic.
///
/// An earlier subtask becomes a dependency when one of the words in its name
/// longer than `min_word_len` characters appears in the requirement. The kind
/// comes from marker phrases in the requirement: a data marker wins over an
/// ordering marker, and no marker means a soft dependency.
#[derive(Debug, Clone)]
pub struct KeywordInference {
  pub min_word_len: usize,
  pub data_markers: Vec<String>,
  pub ordering_markers: Vec<String>,
}

impl KeywordInference {
  /// Kind applied to every dependency inferred for `requirement`.
  pub fn classify(&self, requirement: &str) -> DependencyKind {
    if self
      .data_markers
      .iter()
      .any(|m| contains_phrase(requirement, m))
    {
      DependencyKind::Data
    } else if self
      .ordering_markers
      .iter()
      .any(|m| contains_phrase(requirement, m))
    {
      DependencyKind::Ordering
    } else {
      DependencyKind::Soft
    }
  }
}

impl Default for KeywordInference {
  fn default() -> Self {
    Self {
      min_word_len: 4,
      data_markers: ["using", "based on", "output of", "output from"]
        .into_iter()
        .map(String::from)
        .collect(),
      ordering_markers: ["after", "following"]
        .into_iter()
        .map(String::from)
        .collect(),
    }
  }
}

impl DependencyInference for KeywordInference {
  fn infer(&self, requirement: &str, earlier: &[Subtask]) -> Vec<Dependency> {
    let requirement_words: Vec<String> = words(requirement);
    let mut kind = None;

    earlier
      .iter()
      .filter(|subtask| {
        significant_words(&subtask.name, self.min_word_len)
          .iter()
          .any(|w| requirement_words.contains(w))
      })
      .map(|subtask| Dependency {
        id: subtask.id.clone(),
        kind: *kind.get_or_insert_with(|| self.classify(requirement)),
      })
      .collect()
  }
}
