//! Brief rendering with minijinja.

use std::collections::HashSet;

use conductor_config::{BriefSettings, ContextArtifact};
use minijinja::{Environment, Value};
use serde::Serialize;

use crate::error::DecomposeError;
use crate::text::significant_words;

/// Built-in brief layout.
pub const DEFAULT_BRIEF_TEMPLATE: &str = "\
## Goal
{{ goal }}

## Subtask
{{ requirement }}

## Context
{% for artifact in context %}
- {{ artifact.label }}
{% endfor %}

## Constraints
{% for constraint in constraints %}
- {{ constraint }}
{% endfor %}

## Deliverable
{{ deliverable }}";

// Artifacts attach to a requirement when they share a token longer than this.
const ARTIFACT_TOKEN_MIN: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct BriefArtifact {
  pub path: String,
  pub name: Option<String>,
  pub summary: Option<String>,
  /// `name (path): summary`, collapsed when parts are missing.
  pub label: String,
}

impl From<&ContextArtifact> for BriefArtifact {
  fn from(artifact: &ContextArtifact) -> Self {
    let mut label = match &artifact.name {
      Some(name) if name != &artifact.path => format!("{} ({})", name, artifact.path),
      _ => artifact.path.clone(),
    };
    if let Some(summary) = artifact.summary.as_deref().filter(|s| !s.trim().is_empty()) {
      label.push_str(": ");
      label.push_str(summary.trim());
    }

    Self {
      path: artifact.path.clone(),
      name: artifact.name.clone(),
      summary: artifact.summary.clone(),
      label,
    }
  }
}

/// Values available to the brief template.
#[derive(Debug, Clone, Serialize)]
pub struct BriefContext {
  pub goal: String,
  pub requirement: String,
  pub context: Vec<BriefArtifact>,
  pub constraints: Vec<String>,
  pub deliverable: String,
}

/// Renders worker briefs from [`BriefSettings`].
#[derive(Debug)]
pub struct BriefRenderer {
  env: Environment<'static>,
  template: String,
  constraints: Vec<String>,
  deliverable: String,
}

impl BriefRenderer {
  /// Create a renderer, checking that a custom template parses.
  pub fn new(settings: &BriefSettings) -> Result<Self, DecomposeError> {
    let template = settings
      .template
      .clone()
      .unwrap_or_else(|| DEFAULT_BRIEF_TEMPLATE.to_string());

    environment()
      .template_from_str(&template)
      .map(|_| ())
      .map_err(|e| DecomposeError::Template {
        message: e.to_string(),
      })?;

    Ok(Self {
      env: environment(),
      template,
      constraints: settings.constraints.clone(),
      deliverable: settings.deliverable.clone(),
    })
  }

  /// Context artifacts sharing a significant token with `requirement`, in
  /// their original order.
  pub fn matching_artifacts<'a>(
    requirement: &str,
    artifacts: &'a [ContextArtifact],
  ) -> Vec<&'a ContextArtifact> {
    let tokens = significant_words(requirement, ARTIFACT_TOKEN_MIN);
    if tokens.is_empty() {
      return Vec::new();
    }

    artifacts
      .iter()
      .filter(|artifact| {
        let mut haystack = artifact.path.clone();
        if let Some(name) = &artifact.name {
          haystack.push(' ');
          haystack.push_str(name);
        }
        let artifact_tokens: HashSet<String> = significant_words(&haystack, ARTIFACT_TOKEN_MIN);
        !artifact_tokens.is_disjoint(&tokens)
      })
      .collect()
  }

  pub fn context_for(
    &self,
    goal: &str,
    requirement: &str,
    artifacts: &[ContextArtifact],
  ) -> BriefContext {
    BriefContext {
      goal: goal.to_string(),
      requirement: requirement.to_string(),
      context: Self::matching_artifacts(requirement, artifacts)
        .into_iter()
        .map(BriefArtifact::from)
        .collect(),
      constraints: self.constraints.clone(),
      deliverable: self.deliverable.clone(),
    }
  }

  pub fn render(&self, context: &BriefContext) -> Result<String, DecomposeError> {
    self
      .env
      .render_str(&self.template, Value::from_serialize(context))
      .map_err(|e| DecomposeError::Template {
        message: e.to_string(),
      })
  }

  /// Build the context for one requirement and render it.
  pub fn brief(
    &self,
    goal: &str,
    requirement: &str,
    artifacts: &[ContextArtifact],
  ) -> Result<String, DecomposeError> {
    self.render(&self.context_for(goal, requirement, artifacts))
  }
}

fn environment<'source>() -> Environment<'source> {
  let mut env = Environment::new();
  env.set_trim_blocks(true);
  env.set_lstrip_blocks(true);
  env
}
