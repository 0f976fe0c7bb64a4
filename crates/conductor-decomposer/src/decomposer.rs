use conductor_config::{ContextArtifact, DecomposerSettings, OrchestratorConfig, RequirementDef};
use conductor_plan::Subtask;
use tracing::{debug, info, instrument};

use crate::brief::BriefRenderer;
use crate::error::DecomposeError;
use crate::inference::{DependencyInference, KeywordInference};
use crate::registry::WorkerRegistry;

/// Turns a goal and its requirements into subtasks.
#[derive(Debug)]
pub struct TaskDecomposer<I = KeywordInference> {
  registry: WorkerRegistry,
  briefs: BriefRenderer,
  inference: I,
  settings: DecomposerSettings,
}

impl TaskDecomposer<KeywordInference> {
  /// Decomposer with keyword inference, configured from `config`.
  pub fn from_config(config: &OrchestratorConfig) -> Result<Self, DecomposeError> {
    Self::with_inference(config, KeywordInference::default())
  }
}

impl<I: DependencyInference> TaskDecomposer<I> {
  pub fn with_inference(config: &OrchestratorConfig, inference: I) -> Result<Self, DecomposeError> {
    Ok(Self {
      registry: WorkerRegistry::new(&config.registry),
      briefs: BriefRenderer::new(&config.brief)?,
      inference,
      settings: config.decomposer.clone(),
    })
  }

  /// Produce one subtask per requirement, in input order.
  ///
  /// Ids are `task-1`, `task-2`, ... Dependencies only ever point at earlier
  /// subtasks. A declared dependency overrides the kind of an inferred one
  /// on the same subtask.
  #[instrument(name = "decompose", skip_all, fields(requirements = requirements.len()))]
  pub fn decompose(
    &self,
    goal: &str,
    requirements: &[RequirementDef],
    context_artifacts: &[ContextArtifact],
  ) -> Result<Vec<Subtask>, DecomposeError> {
    let mut subtasks: Vec<Subtask> = Vec::with_capacity(requirements.len());

    for (index, requirement) in requirements.iter().enumerate() {
      let text = requirement.text();
      let worker = self.registry.select(text);
      let brief = self.briefs.brief(goal, text, context_artifacts)?;

      let mut subtask = Subtask::new(format!("task-{}", index + 1), text, worker)
        .with_brief(brief)
        .with_retry_policy(self.settings.retry_policy.clone())
        .with_timeout_ms(self.settings.timeout_ms);

      for declared in requirement.declared_dependencies() {
        let upstream = subtasks
          .get(declared.index)
          .ok_or(DecomposeError::InvalidDependency {
            requirement: index,
            index: declared.index,
          })?;
        subtask.add_dependency(upstream.id.clone(), declared.kind);
      }

      for inferred in self.inference.infer(text, &subtasks) {
        subtask.add_dependency(inferred.id, inferred.kind);
      }

      debug!(
        subtask_id = %subtask.id,
        worker = %subtask.assigned_worker,
        dependencies = subtask.depends_on.len(),
        "subtask_decomposed"
      );
      subtasks.push(subtask);
    }

    info!(subtasks = subtasks.len(), "decomposition_complete");
    Ok(subtasks)
  }
}

#[cfg(test)]
mod tests {
  use conductor_config::{DependencyDef, DependencyKind, RetryPolicy};
  use conductor_plan::{Dependency, OrchestrationPlan};

  use super::*;
  use crate::inference::ExplicitInference;

  fn scenario() -> Vec<RequirementDef> {
    vec![
      "Design REST API for users".into(),
      "Implement backend using the API design".into(),
      "Write tests for the backend".into(),
    ]
  }

  #[test]
  fn test_decompose_three_requirements() {
    let decomposer = TaskDecomposer::from_config(&OrchestratorConfig::default()).unwrap();
    let subtasks = decomposer.decompose("Ship users", &scenario(), &[]).unwrap();

    let ids: Vec<&str> = subtasks.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["task-1", "task-2", "task-3"]);

    let workers: Vec<&str> = subtasks.iter().map(|s| s.assigned_worker.as_str()).collect();
    assert_eq!(workers, vec!["architect", "backend-engineer", "test-engineer"]);

    assert!(subtasks[0].depends_on.is_empty());
    assert_eq!(
      subtasks[1].depends_on,
      vec![Dependency {
        id: "task-1".to_string(),
        kind: DependencyKind::Data,
      }]
    );
    assert_eq!(subtasks[2].dependency_kind("task-2"), Some(DependencyKind::Soft));

    let plan = OrchestrationPlan::build("Ship users", subtasks).unwrap();
    assert_eq!(
      plan.phase_assignments(),
      vec![vec!["task-1"], vec!["task-2"], vec!["task-3"]]
    );
  }

  #[test]
  fn test_unrelated_requirements_share_one_phase() {
    let decomposer = TaskDecomposer::from_config(&OrchestratorConfig::default()).unwrap();
    let requirements: Vec<RequirementDef> = vec![
      "Write onboarding docs".into(),
      "Provision staging cluster".into(),
      "Celebrate launch".into(),
    ];
    let subtasks = decomposer.decompose("Launch", &requirements, &[]).unwrap();

    assert!(subtasks.iter().all(|s| s.depends_on.is_empty()));
    assert_eq!(subtasks[2].assigned_worker, "generalist");

    let plan = OrchestrationPlan::build("Launch", subtasks).unwrap();
    assert_eq!(plan.phases().len(), 1);
    assert_eq!(plan.phases()[0].subtask_ids.len(), 3);
  }

  #[test]
  fn test_settings_applied_to_every_subtask() {
    let mut config = OrchestratorConfig::default();
    config.decomposer.retry_policy = RetryPolicy::none();
    config.decomposer.timeout_ms = 5_000;

    let decomposer = TaskDecomposer::from_config(&config).unwrap();
    let subtasks = decomposer.decompose("Ship users", &scenario(), &[]).unwrap();

    for subtask in &subtasks {
      assert_eq!(subtask.retry_policy, RetryPolicy::none());
      assert_eq!(subtask.timeout_ms, 5_000);
      assert!(subtask.brief.contains("## Goal\nShip users"));
      assert!(subtask.brief.contains(&subtask.name));
    }
  }

  #[test]
  fn test_declared_dependency_overrides_inferred_kind() {
    let decomposer = TaskDecomposer::from_config(&OrchestratorConfig::default()).unwrap();
    let mut requirements = scenario();
    requirements[2] = RequirementDef::Detailed {
      text: "Write tests for the backend".to_string(),
      depends_on: vec![DependencyDef {
        index: 1,
        kind: DependencyKind::Ordering,
      }],
    };

    let subtasks = decomposer.decompose("Ship users", &requirements, &[]).unwrap();
    assert_eq!(subtasks[2].depends_on.len(), 1);
    assert_eq!(subtasks[2].dependency_kind("task-2"), Some(DependencyKind::Ordering));
  }

  #[test]
  fn test_explicit_inference_uses_declarations_only() {
    let decomposer =
      TaskDecomposer::with_inference(&OrchestratorConfig::default(), ExplicitInference).unwrap();
    let requirements = vec![
      RequirementDef::from("Design REST API for users"),
      RequirementDef::from("Implement backend using the API design"),
      RequirementDef::Detailed {
        text: "Deploy".to_string(),
        depends_on: vec![DependencyDef {
          index: 0,
          kind: DependencyKind::Data,
        }],
      },
    ];

    let subtasks = decomposer.decompose("Ship users", &requirements, &[]).unwrap();
    assert!(subtasks[1].depends_on.is_empty());
    assert_eq!(subtasks[2].dependency_kind("task-1"), Some(DependencyKind::Data));
  }

  #[test]
  fn test_forward_declaration_is_rejected() {
    let decomposer = TaskDecomposer::from_config(&OrchestratorConfig::default()).unwrap();
    let requirements = vec![
      RequirementDef::Detailed {
        text: "First".to_string(),
        depends_on: vec![DependencyDef {
          index: 0,
          kind: DependencyKind::Data,
        }],
      },
      RequirementDef::from("Second"),
    ];

    let result = decomposer.decompose("goal", &requirements, &[]);
    assert!(matches!(
      result,
      Err(DecomposeError::InvalidDependency {
        requirement: 0,
        index: 0
      })
    ));
  }

  #[test]
  fn test_context_artifacts_reach_brief() {
    let decomposer = TaskDecomposer::from_config(&OrchestratorConfig::default()).unwrap();
    let artifacts = vec![ContextArtifact::new("docs/backend-conventions.md")];
    let subtasks = decomposer
      .decompose("Ship users", &scenario(), &artifacts)
      .unwrap();

    assert!(!subtasks[0].brief.contains("backend-conventions"));
    assert!(subtasks[1].brief.contains("- docs/backend-conventions.md"));
    assert!(subtasks[2].brief.contains("- docs/backend-conventions.md"));
  }
}
