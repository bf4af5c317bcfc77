//! Launching shell commands and supervising the children.
//!
//! Each child gets two kinds of background task on the engine runtime: one
//! pump per captured stream, and one supervisor that reaps the child and
//! publishes its [`Completion`]. Completion is only published once the
//! pumps hit EOF or `drain_timeout` has passed since exit, so a caller that
//! sees a completed child also sees all of its output.

use chrono::{DateTime, Utc};
use procctl_common::{Error, ProcId, Result};
use procctl_process::shell_command;
use procctl_stdio::{pump_output, BufferLimit, SharedBuffer, StreamSource};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;

/// Lifecycle of an executed child as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Running,
    Exited(ExitStatus),
    /// The child could not be waited on.
    Failed,
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        !matches!(self, Completion::Running)
    }

    /// `None` while running, on failure, or when a signal ended the child.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Completion::Exited(status) => status.code(),
            _ => None,
        }
    }
}

/// A child started through the engine.
#[derive(Debug)]
pub struct ExecutedProcess {
    pid: ProcId,
    command: String,
    stdin: Option<ChildStdin>,
    output: SharedBuffer,
    completion: watch::Receiver<Completion>,
    started_at: DateTime<Utc>,
}

impl ExecutedProcess {
    pub fn proc_id(&self) -> ProcId {
        self.pid
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completion(&self) -> Completion {
        self.completion.borrow().clone()
    }

    pub fn is_complete(&self) -> bool {
        self.completion.borrow().is_complete()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.completion.borrow().exit_code()
    }

    pub fn output(&self) -> &SharedBuffer {
        &self.output
    }

    pub fn stdin_open(&self) -> bool {
        self.stdin.is_some()
    }

    /// Close the stdin pipe; the child reads EOF. False if already closed.
    pub fn close_stdin(&mut self) -> bool {
        self.stdin.take().is_some()
    }

    /// Write `data` to the child's stdin, giving up after `timeout`.
    ///
    /// Returns the number of bytes accepted, which is short of `data.len()`
    /// only when the timeout expired or the pipe broke part way.
    pub fn write_stdin(&mut self, runtime: &Runtime, data: &[u8], timeout: Duration) -> Result<usize> {
        let pid = self.pid;
        let stdin = self.stdin.as_mut().ok_or_else(|| Error::pipe_closed("stdin"))?;

        runtime.block_on(async move {
            let deadline = tokio::time::Instant::now() + timeout;
            let mut written = 0;

            while written < data.len() {
                match tokio::time::timeout_at(deadline, stdin.write(&data[written..])).await {
                    Err(_) => {
                        debug!("Stdin write to process {} timed out after {} bytes", pid, written);
                        break;
                    }
                    Ok(Ok(0)) => return Err(Error::pipe_closed("stdin")),
                    Ok(Ok(n)) => written += n,
                    Ok(Err(e)) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Ok(Err(e)) if written == 0 => return Err(Error::from_io(pid, "write stdin", e)),
                    Ok(Err(e)) => {
                        debug!("Stdin of process {} failed after {} bytes: {}", pid, written, e);
                        break;
                    }
                }
            }

            Ok(written)
        })
    }

    /// Block until the child has completed.
    pub fn wait(&self, runtime: &Runtime) -> Completion {
        let mut completion = self.completion.clone();
        runtime.block_on(async move {
            let result = match completion.wait_for(Completion::is_complete).await {
                Ok(state) => state.clone(),
                // The supervisor was dropped with the runtime.
                Err(_) => Completion::Failed,
            };
            result
        })
    }
}

/// Start `command` through the configured shell.
///
/// `interactive` children get a stdin pipe; the others read from the null
/// device.
pub fn spawn(
    runtime: &Runtime,
    command: &str,
    config: &EngineConfig,
    limit: &BufferLimit,
    interactive: bool,
) -> Result<ExecutedProcess> {
    let _guard = runtime.enter();

    let mut cmd = Command::from(shell_command(&config.shell, command));
    cmd.stdin(if interactive { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(if config.stdio.capture_stderr {
            Stdio::piped()
        } else {
            Stdio::inherit()
        })
        .kill_on_drop(config.kill_on_drop);

    let mut child = cmd.spawn().map_err(|e| Error::from_spawn(command, e))?;
    let pid = child.id().map(ProcId::from_raw).unwrap_or(ProcId::INVALID);

    let output = SharedBuffer::new(limit.clone());
    let chunk_size = config.stdio.read_chunk_size;
    let mut pumps = Vec::new();

    if let Some(stdout) = child.stdout.take() {
        pumps.push(tokio::spawn(pump_output(
            stdout,
            output.clone(),
            chunk_size,
            StreamSource::Stdout,
            pid.as_raw(),
        )));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(tokio::spawn(pump_output(
            stderr,
            output.clone(),
            chunk_size,
            StreamSource::Stderr,
            pid.as_raw(),
        )));
    }

    let stdin = child.stdin.take();
    let (tx, rx) = watch::channel(Completion::Running);
    tokio::spawn(supervise(child, pumps, config.stdio.drain_timeout, tx, pid));

    info!("Launched process {} for command: {}", pid, command);

    Ok(ExecutedProcess {
        pid,
        command: command.to_string(),
        stdin,
        output,
        completion: rx,
        started_at: Utc::now(),
    })
}

async fn supervise(
    mut child: Child,
    pumps: Vec<JoinHandle<u64>>,
    drain_timeout: Duration,
    tx: watch::Sender<Completion>,
    pid: ProcId,
) {
    let status = child.wait().await;

    let drained = tokio::time::timeout(drain_timeout, async move {
        for pump in pumps {
            let _ = pump.await;
        }
    })
    .await;
    if drained.is_err() {
        // A grandchild still holds the pipe; its output keeps arriving.
        debug!("Output of process {} still open {:?} after exit", pid, drain_timeout);
    }

    let completion = match status {
        Ok(status) => {
            debug!("Process {} exited: {}", pid, status);
            Completion::Exited(status)
        }
        Err(e) => {
            warn!("Failed to wait for process {}: {}", pid, e);
            Completion::Failed
        }
    };
    let _ = tx.send(completion);
}
