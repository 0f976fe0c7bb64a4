use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use conductor_config::{GoalFile, OrchestratorConfig};
use conductor_decomposer::TaskDecomposer;
use conductor_engine::{ExecutionEngine, LogNotifier};
use conductor_plan::OrchestrationPlan;
use conductor_worker::{CommandWorker, EchoWorker, Worker};

/// Conductor - decompose a goal into subtasks and run them in phases
#[derive(Parser)]
#[command(name = "conductor")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.conductor)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Log level used when RUST_LOG is not set
  #[arg(long, global = true, default_value = "info")]
  log_level: String,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Decompose a goal file and print the execution plan
  Plan {
    /// Path to the goal file (JSON)
    goal_file: PathBuf,

    /// Path to the config file (default: <data-dir>/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },

  /// Decompose a goal file and execute the plan
  Run {
    /// Path to the goal file (JSON)
    goal_file: PathBuf,

    /// Path to the config file (default: <data-dir>/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Echo briefs back instead of running worker commands
    #[arg(long)]
    dry_run: bool,

    /// Override the worker pool size for parallel phases
    #[arg(long)]
    max_concurrency: Option<usize>,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
  Text,
  Json,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(&cli.log_level);

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".conductor"),
  };

  match cli.command {
    Some(Commands::Plan {
      goal_file,
      config,
      format,
    }) => {
      let config = load_config(config.as_deref(), &data_dir)?;
      plan_goal(&goal_file, &config, format)?;
    }
    Some(Commands::Run {
      goal_file,
      config,
      dry_run,
      max_concurrency,
    }) => {
      let mut config = load_config(config.as_deref(), &data_dir)?;
      if let Some(max_concurrency) = max_concurrency {
        config.engine.max_concurrency = max_concurrency;
      }

      let rt = tokio::runtime::Runtime::new()?;
      let success = rt.block_on(async { run_goal(&goal_file, config, dry_run).await })?;
      if !success {
        std::process::exit(1);
      }
    }
    None => {
      println!("conductor - use --help to see available commands");
    }
  }

  Ok(())
}

fn init_tracing(fallback_level: &str) {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(fallback_level))
    .unwrap_or_else(|_| EnvFilter::new("info"));

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}

/// `--config` if given, else `<data_dir>/config.json` when present, else defaults.
fn load_config(explicit: Option<&Path>, data_dir: &Path) -> Result<OrchestratorConfig> {
  let path = match explicit {
    Some(path) => path.to_path_buf(),
    None => {
      let path = data_dir.join("config.json");
      if !path.exists() {
        return Ok(OrchestratorConfig::default());
      }
      path
    }
  };

  info!(path = %path.display(), "loading_config");
  OrchestratorConfig::load(&path)
    .with_context(|| format!("failed to load config: {}", path.display()))
}

fn build_plan(goal_file: &Path, config: &OrchestratorConfig) -> Result<OrchestrationPlan> {
  let goal = GoalFile::load(goal_file)
    .with_context(|| format!("failed to load goal file: {}", goal_file.display()))?;

  let decomposer =
    TaskDecomposer::from_config(config).context("failed to create task decomposer")?;
  let subtasks = decomposer
    .decompose(&goal.goal, &goal.requirements, &goal.context_artifacts)
    .context("failed to decompose goal")?;

  OrchestrationPlan::build(goal.goal, subtasks).context("failed to build execution plan")
}

fn plan_goal(goal_file: &Path, config: &OrchestratorConfig, format: OutputFormat) -> Result<()> {
  let plan = build_plan(goal_file, config)?;

  match format {
    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    OutputFormat::Text => {
      println!("Goal: {}", plan.goal());
      println!("Plan: {}", plan.plan_id());
      println!("Created: {}", plan.created_at().to_rfc3339());
      for phase in plan.phases() {
        println!();
        println!("Phase {} ({:?})", phase.id, phase.mode);
        for subtask in phase.subtask_ids.iter().filter_map(|id| plan.subtask(id)) {
          println!("  {} [{}] {}", subtask.id, subtask.assigned_worker, subtask.name);
          for dep in &subtask.depends_on {
            println!("    depends on {} ({:?})", dep.id, dep.kind);
          }
        }
      }
    }
  }

  Ok(())
}

async fn run_goal(goal_file: &Path, config: OrchestratorConfig, dry_run: bool) -> Result<bool> {
  let plan = build_plan(goal_file, &config)?;
  eprintln!(
    "Planned {} subtasks in {} phases",
    plan.len(),
    plan.phases().len()
  );

  let worker: Arc<dyn Worker> = if dry_run {
    Arc::new(EchoWorker)
  } else {
    Arc::new(CommandWorker::new(config.workers.clone()))
  };
  let engine = ExecutionEngine::with_notifier(worker, config.engine.clone(), LogNotifier);

  let cancel = CancellationToken::new();
  let ctrl_c = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupt_received");
      ctrl_c.cancel();
    }
  });

  let result = engine.execute_with_cancel(plan, cancel).await;

  eprintln!("{}", result.summary());
  for error in &result.errors {
    eprintln!("error: {}", error);
  }
  for warning in &result.warnings {
    eprintln!("warning: {}", warning);
  }

  println!("{}", serde_json::to_string_pretty(&result)?);

  Ok(result.success)
}
