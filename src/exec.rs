//! Command bridge: run a client-supplied shell command and return its
//! captured standard output.
//!
//! Input and output are both bounded. Output past the capture capacity is
//! discarded and flagged with [`TRUNCATION_MARKER`]. A command can be cut
//! off by an optional deadline or by the service shutting down.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::buffer::BoundedBuf;
use crate::config::{ExecConfig, LimitsConfig};
use crate::http::body::{BodyError, BodyReader};
use crate::http::response::{Response, StatusCode};

pub const TRUNCATION_MARKER: &[u8] = b"\n[truncated]";
pub const TIMEOUT_MARKER: &[u8] = b"\n[timed out]";

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn shell: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("shell stdout was not captured")]
    NoStdout,

    #[error("reading command output failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("command cancelled by shutdown")]
    Cancelled,
}

/// Output of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    /// More output existed than fit in the capture buffer.
    pub truncated: bool,
    /// The deadline expired before the command finished.
    pub timed_out: bool,
}

impl CapturedOutput {
    /// Captured bytes followed by the applicable marker.
    pub fn into_body(self) -> Vec<u8> {
        let mut body = self.stdout;
        if self.truncated {
            body.extend_from_slice(TRUNCATION_MARKER);
        } else if self.timed_out {
            body.extend_from_slice(TIMEOUT_MARKER);
        }
        body
    }
}

enum Capture {
    Finished { truncated: bool },
    TimedOut,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct CommandBridge {
    shell: PathBuf,
    max_command: usize,
    max_output: usize,
    timeout: Option<Duration>,
    chunk_size: usize,
}

impl CommandBridge {
    pub fn new(config: &ExecConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            max_command: config.max_command_bytes,
            max_output: config.max_output_bytes,
            timeout: config.timeout(),
            chunk_size: LimitsConfig::default().chunk_size,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Size of the reads that pull the command body off the connection.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn max_command(&self) -> usize {
        self.max_command
    }

    /// Reads exactly `declared` command bytes.
    ///
    /// Callers check `declared` against [`CommandBridge::max_command`] first;
    /// a longer body overflows the command buffer.
    pub async fn read_command<R>(
        &self,
        body_prefix: Bytes,
        declared: u64,
        stream: &mut R,
    ) -> Result<Vec<u8>, BodyError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut body = BodyReader::new(body_prefix, declared);
        let mut command = BoundedBuf::with_capacity(self.max_command);
        let mut chunk = vec![0u8; self.chunk_size];

        while !body.is_done() {
            let n = body.read_chunk(stream, &mut chunk).await?;
            command.try_extend_from_slice(&chunk[..n])?;
        }

        // C-string semantics: the command ends at the first NUL.
        let mut command = command.into_vec();
        if let Some(nul) = command.iter().position(|&b| b == 0) {
            command.truncate(nul);
        }
        Ok(command)
    }

    /// Runs `command` through the shell and captures its stdout.
    ///
    /// The exit status is only logged.
    pub async fn run(
        &self,
        command: &[u8],
        mut cancel: broadcast::Receiver<()>,
    ) -> Result<CapturedOutput, ExecError> {
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(OsStr::from_bytes(command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(ExecError::Spawn)?;

        let mut stdout = child.stdout.take().ok_or(ExecError::NoStdout)?;
        let mut out = BoundedBuf::with_capacity(self.max_output);
        let deadline = self.timeout.map(|t| Instant::now() + t);

        let capture = tokio::select! {
            res = fill_bounded(&mut stdout, &mut out) => {
                Capture::Finished { truncated: res.map_err(ExecError::Read)? }
            }
            _ = expired(deadline) => Capture::TimedOut,
            Ok(()) = cancel.recv() => Capture::Cancelled,
        };
        drop(stdout);

        let timed_out = match capture {
            Capture::Finished { truncated: true } => {
                // Nobody reads the rest; don't wait for the writer to notice.
                terminate(&mut child).await;
                return Ok(CapturedOutput {
                    stdout: out.into_vec(),
                    truncated: true,
                    timed_out: false,
                });
            }
            Capture::Finished { truncated: false } => {
                tokio::select! {
                    status = child.wait() => {
                        match status {
                            Ok(status) => tracing::debug!(%status, "command exited"),
                            Err(e) => tracing::warn!(error = %e, "waiting for command failed"),
                        }
                        false
                    }
                    _ = expired(deadline) => true,
                    Ok(()) = cancel.recv() => {
                        terminate(&mut child).await;
                        return Err(ExecError::Cancelled);
                    }
                }
            }
            Capture::TimedOut => true,
            Capture::Cancelled => {
                terminate(&mut child).await;
                return Err(ExecError::Cancelled);
            }
        };

        if timed_out {
            tracing::warn!(timeout = ?self.timeout, "command timed out, killing it");
            terminate(&mut child).await;
        }

        Ok(CapturedOutput {
            stdout: out.into_vec(),
            truncated: false,
            timed_out,
        })
    }

    /// POST /exec
    pub async fn handle<R>(
        &self,
        declared_length: Option<u64>,
        body_prefix: Bytes,
        stream: &mut R,
        cancel: broadcast::Receiver<()>,
    ) -> Response
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let declared = match declared_length {
            Some(len) if len <= self.max_command as u64 => len,
            _ => return Response::bad_request("Content-Length missing or too large\n"),
        };

        let command = match self.read_command(body_prefix, declared, stream).await {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, "command body incomplete");
                return Response::internal_error();
            }
        };

        tracing::info!(command = %String::from_utf8_lossy(&command), "executing command");

        match self.run(&command, cancel).await {
            Ok(output) => {
                if output.truncated {
                    tracing::debug!(limit = self.max_output, "command output truncated");
                }
                Response::text(StatusCode::Ok, output.into_body())
            }
            Err(e) => {
                tracing::warn!(error = %e, "command failed");
                Response::internal_error()
            }
        }
    }
}

/// Reads into `out` until EOF or until it is full.
///
/// Returns `true` when the buffer filled and the stream still had data.
async fn fill_bounded(stdout: &mut ChildStdout, out: &mut BoundedBuf) -> std::io::Result<bool> {
    loop {
        if out.is_full() {
            let mut extra = [0u8; 1];
            return Ok(stdout.read(&mut extra).await? > 0);
        }
        if out.read_from(stdout).await? == 0 {
            return Ok(false);
        }
    }
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "kill failed, command already gone");
    }
}
