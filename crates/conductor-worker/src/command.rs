//! Subprocess-backed workers.

use std::process::Stdio;

use async_trait::async_trait;
use conductor_config::{CommandDef, WorkerCommands};
use conductor_plan::TaskOutput;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::WorkerError;
use crate::worker::{Worker, WorkerRequest};

const STDERR_PREVIEW_CHARS: usize = 512;

/// Runs one subprocess per attempt.
///
/// The request is written to stdin as a single JSON line. Stdout that parses
/// as JSON becomes [`TaskOutput::Json`], anything else [`TaskOutput::Text`].
///
/// The child is not killed when the engine stops waiting on it: a timed-out
/// attempt leaves the process running to completion in the background.
#[derive(Debug, Clone, Default)]
pub struct CommandWorker {
  commands: WorkerCommands,
}

impl CommandWorker {
  pub fn new(commands: WorkerCommands) -> Self {
    Self { commands }
  }

  /// A worker that runs `command` for every worker id.
  pub fn uniform(command: CommandDef) -> Self {
    Self::new(WorkerCommands {
      default: Some(command),
      ..WorkerCommands::default()
    })
  }

  fn build_command(&self, def: &CommandDef) -> Command {
    let mut cmd = Command::new(&def.program);
    cmd.args(&def.args);
    if let Some(dir) = &def.working_dir {
      cmd.current_dir(dir);
    }
    if !def.env.is_empty() {
      cmd.envs(&def.env);
    }
    cmd.kill_on_drop(false);
    cmd
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());
    cmd
  }
}

#[async_trait]
impl Worker for CommandWorker {
  #[instrument(
    name = "command_worker",
    skip(self, request),
    fields(subtask_id = %request.subtask_id, worker_id = %request.worker_id)
  )]
  async fn delegate(&self, request: WorkerRequest) -> Result<TaskOutput, WorkerError> {
    let def = self
      .commands
      .command_for(&request.worker_id)
      .ok_or_else(|| WorkerError::NoCommand {
        worker_id: request.worker_id.clone(),
      })?;

    let payload =
      serde_json::to_string(&request).map_err(|e| WorkerError::failed(e.to_string()))?;

    let mut child = self
      .build_command(def)
      .spawn()
      .map_err(|source| WorkerError::Spawn {
        program: def.program.clone(),
        source,
      })?;

    debug!(program = %def.program, "worker_process_started");

    if let Some(mut stdin) = child.stdin.take() {
      // A worker that ignores its input may exit before reading it.
      if let Err(source) = write_request(&mut stdin, &payload).await {
        if source.kind() != std::io::ErrorKind::BrokenPipe {
          return Err(WorkerError::Io { source });
        }
      }
    }

    let output = child
      .wait_with_output()
      .await
      .map_err(|source| WorkerError::Io { source })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(WorkerError::ProcessFailed {
        status: output.status.to_string(),
        stderr: preview(stderr.trim(), STDERR_PREVIEW_CHARS),
      });
    }

    Ok(parse_output(&String::from_utf8_lossy(&output.stdout)))
  }
}

async fn write_request(
  stdin: &mut tokio::process::ChildStdin,
  payload: &str,
) -> std::io::Result<()> {
  stdin.write_all(payload.as_bytes()).await?;
  stdin.write_all(b"\n").await?;
  stdin.shutdown().await
}

fn parse_output(stdout: &str) -> TaskOutput {
  let trimmed = stdout.trim();
  match serde_json::from_str::<serde_json::Value>(trimmed) {
    Ok(value) if !trimmed.is_empty() => TaskOutput::Json(value),
    _ => TaskOutput::Text(trimmed.to_string()),
  }
}

fn preview(text: &str, max_chars: usize) -> String {
  if text.chars().count() <= max_chars {
    return text.to_string();
  }
  let mut cut: String = text.chars().take(max_chars).collect();
  cut.push_str("...");
  cut
}
