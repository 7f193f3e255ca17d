//! Running the external Maven process.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ExecuteError {
  #[error("unable to start {command}: {source}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  #[error("command failed with exit code {code:?}: {command}")]
  Failed { command: String, code: Option<i32> },

  #[error("io error while running {command}: {source}")]
  Io {
    command: String,
    #[source]
    source: std::io::Error,
  },
}

/// One invocation of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
  pub command: PathBuf,
  pub arguments: Vec<String>,
  pub dir: PathBuf,
}

impl Execution {
  pub fn display(&self) -> String {
    let mut parts = vec![self.command.display().to_string()];
    parts.extend(self.arguments.iter().cloned());
    shell_words::join(parts)
  }
}

/// Runs an [`Execution`] to completion.
pub trait Executor {
  fn execute(&self, execution: &Execution) -> impl Future<Output = Result<(), ExecuteError>>;
}

/// Spawns the command as a child process, streaming its output into the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExecutor;

impl Executor for CommandExecutor {
  async fn execute(&self, execution: &Execution) -> Result<(), ExecuteError> {
    let rendered = execution.display();
    info!(command = %rendered, dir = ?execution.dir, "running maven");

    let mut child = Command::new(&execution.command)
      .args(&execution.arguments)
      .current_dir(&execution.dir)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|source| ExecuteError::Spawn {
        command: rendered.clone(),
        source,
      })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (out, err) = tokio::join!(forward(stdout, "stdout"), forward(stderr, "stderr"));

    // Reap the child before reporting a stream failure
    let status = child.wait().await;
    let io_err = |source| ExecuteError::Io {
      command: rendered.clone(),
      source,
    };
    out.map_err(io_err)?;
    err.map_err(io_err)?;
    let status = status.map_err(io_err)?;

    if !status.success() {
      return Err(ExecuteError::Failed {
        command: rendered,
        code: status.code(),
      });
    }

    debug!(command = %rendered, "maven finished");
    Ok(())
  }
}

async fn forward<R: AsyncRead + Unpin>(stream: Option<R>, name: &'static str) -> std::io::Result<()> {
  let Some(stream) = stream else {
    return Ok(());
  };
  let mut reader = BufReader::new(stream);
  let mut buf = Vec::new();
  loop {
    buf.clear();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
      return Ok(());
    }
    let line = String::from_utf8_lossy(&buf);
    info!(stream = name, "{}", line.trim_end_matches(['\n', '\r']));
  }
}
