use std::collections::HashSet;

use conductor_config::WorkerRegistryDef;

use crate::text::{contains_phrase, words};

#[derive(Debug, Clone)]
struct RegisteredWorker {
  id: String,
  keywords: Vec<String>,
}

/// Routes requirement text to a worker by keyword hits.
#[derive(Debug, Clone)]
pub struct WorkerRegistry {
  workers: Vec<RegisteredWorker>,
  default_worker: String,
}

impl WorkerRegistry {
  pub fn new(def: &WorkerRegistryDef) -> Self {
    let workers = def
      .workers
      .iter()
      .map(|w| RegisteredWorker {
        id: w.id.clone(),
        keywords: w
          .keywords
          .iter()
          .map(|k| k.trim().to_lowercase())
          .filter(|k| !k.is_empty())
          .collect(),
      })
      .collect();

    Self {
      workers,
      default_worker: def.default_worker.clone(),
    }
  }

  /// Number of distinct keywords of `worker_id` found in `text`.
  pub fn score(&self, worker_id: &str, text: &str) -> usize {
    self
      .workers
      .iter()
      .find(|w| w.id == worker_id)
      .map(|w| score_keywords(&w.keywords, text))
      .unwrap_or(0)
  }

  /// Best-scoring worker. Ties go to the earlier declaration; no hits at all
  /// selects the default worker.
  pub fn select(&self, text: &str) -> &str {
    let mut best: Option<(&str, usize)> = None;
    for worker in &self.workers {
      let score = score_keywords(&worker.keywords, text);
      if score == 0 {
        continue;
      }
      if best.is_none_or(|(_, top)| score > top) {
        best = Some((worker.id.as_str(), score));
      }
    }
    best
      .map(|(id, _)| id)
      .unwrap_or(self.default_worker.as_str())
  }
}

impl Default for WorkerRegistry {
  fn default() -> Self {
    Self::new(&WorkerRegistryDef::default())
  }
}

fn score_keywords(keywords: &[String], text: &str) -> usize {
  let tokens: HashSet<String> = words(text).into_iter().collect();
  keywords
    .iter()
    .collect::<HashSet<_>>()
    .into_iter()
    .filter(|k| {
      if k.contains(char::is_whitespace) {
        contains_phrase(text, k)
      } else {
        tokens.contains(k.as_str())
      }
    })
    .count()
}

#[cfg(test)]
mod tests {
  use super::*;
  use conductor_config::WorkerDef;

  fn registry() -> WorkerRegistry {
    WorkerRegistry::new(&WorkerRegistryDef {
      workers: vec![
        WorkerDef::new("first", &["alpha", "shared"]),
        WorkerDef::new("second", &["beta", "shared", "Machine Learning"]),
      ],
      default_worker: "fallback".to_string(),
    })
  }

  #[test]
  fn test_highest_score_wins() {
    assert_eq!(registry().select("beta and shared work"), "second");
  }

  #[test]
  fn test_tie_goes_to_declaration_order() {
    assert_eq!(registry().select("only shared"), "first");
  }

  #[test]
  fn test_no_hits_falls_back_to_default() {
    assert_eq!(registry().select("nothing relevant"), "fallback");
  }

  #[test]
  fn test_keywords_are_case_insensitive_words() {
    let registry = registry();
    assert_eq!(registry.score("first", "ALPHA release"), 1);
    assert_eq!(registry.score("first", "alphabet"), 0);
    assert_eq!(registry.score("second", "a machine learning model"), 1);
  }

  #[test]
  fn test_default_registry_routes_common_requirements() {
    let registry = WorkerRegistry::default();
    assert_eq!(registry.select("Design REST API for users"), "architect");
    assert_eq!(
      registry.select("Implement backend using the API design"),
      "backend-engineer"
    );
    assert_eq!(registry.select("Write tests for the backend"), "test-engineer");
    assert_eq!(registry.select("Celebrate the launch"), "generalist");
  }
}
