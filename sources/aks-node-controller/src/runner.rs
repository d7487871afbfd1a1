//! Running the provisioning command.
//!
//! [`ExecRunner`] spawns the real process; [`DryRunRunner`] only logs what would have run.  Both
//! sit behind [`CommandRunner`] so the orchestrator can be driven by a fake in tests.

use crate::command::ProcessSpec;
use crate::Cancel;
use async_trait::async_trait;
use log::{debug, info, warn};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use snafu::{OptionExt, ResultExt};
use std::collections::VecDeque;
use std::os::unix::process::CommandExt;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

/// How much of each output stream is kept for the outcome record.
const OUTPUT_TAIL_BYTES: usize = 1024 * 1024;

pub mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(super)))]
    pub enum Error {
        #[snafu(display("Failed to start '{}': {}", program, source))]
        Spawn {
            program: String,
            source: std::io::Error,
        },

        #[snafu(display("Child process has no {} pipe", stream))]
        MissingPipe { stream: &'static str },

        #[snafu(display("Failed waiting for '{}': {}", program, source))]
        Wait {
            program: String,
            source: std::io::Error,
        },

        #[snafu(display("Failed to capture child {}: {}", stream, source))]
        Capture {
            stream: &'static str,
            source: std::io::Error,
        },

        #[snafu(display("Output capture task for {} failed: {}", stream, source))]
        CaptureTask {
            stream: &'static str,
            source: tokio::task::JoinError,
        },

        #[snafu(display("provisioning command cancelled"))]
        Cancelled,
    }
}
pub use error::Error;
pub type Result<T> = std::result::Result<T, error::Error>;

/// What a finished child left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the child was killed by a signal.
    pub code: Option<i32>,
    /// The tail of the child's standard output.
    pub stdout: String,
    /// The tail of the child's standard error.
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `spec` to completion, or until `cancel` resolves.
    async fn run(&self, spec: &ProcessSpec, cancel: Cancel) -> Result<ProcessOutput>;
}

/// Spawns the command in its own process group, copying its output to ours as it goes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecRunner;

#[async_trait]
impl CommandRunner for ExecRunner {
    async fn run(&self, spec: &ProcessSpec, cancel: Cancel) -> Result<ProcessOutput> {
        info!("Running '{}'", spec.program);
        let mut command = std::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .env_clear()
            .envs(spec.env_pairs())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);
        let mut child = Command::from(command)
            .kill_on_drop(true)
            .spawn()
            .context(error::SpawnSnafu {
                program: &spec.program,
            })?;

        let stdout = child
            .stdout
            .take()
            .context(error::MissingPipeSnafu { stream: "stdout" })?;
        let stderr = child
            .stderr
            .take()
            .context(error::MissingPipeSnafu { stream: "stderr" })?;
        let stdout_task = tokio::spawn(tee(stdout, tokio::io::stdout()));
        let stderr_task = tokio::spawn(tee(stderr, tokio::io::stderr()));

        let status = tokio::select! {
            status = child.wait() => status.context(error::WaitSnafu { program: &spec.program })?,
            _ = cancel => {
                if let Some(pid) = child.id() {
                    warn!("Cancelled, sending SIGTERM to process group {}", pid);
                    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                        warn!("Failed to signal process group {}: {}", pid, e);
                    }
                }
                if let Err(e) = child.wait().await {
                    warn!("Failed to reap cancelled child: {}", e);
                }
                return error::CancelledSnafu.fail();
            }
        };

        let stdout = stdout_task
            .await
            .context(error::CaptureTaskSnafu { stream: "stdout" })?
            .context(error::CaptureSnafu { stream: "stdout" })?;
        let stderr = stderr_task
            .await
            .context(error::CaptureTaskSnafu { stream: "stderr" })?
            .context(error::CaptureSnafu { stream: "stderr" })?;

        Ok(ProcessOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Logs the command instead of running it, and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(&self, spec: &ProcessSpec, _cancel: Cancel) -> Result<ProcessOutput> {
        info!("dry-run: {}", spec);
        for entry in spec.redacted_env() {
            debug!("dry-run env: {}", entry);
        }
        Ok(ProcessOutput {
            code: Some(0),
            ..Default::default()
        })
    }
}

/// Copies `reader` into `writer` while keeping the last bytes seen.
async fn tee<R, W>(mut reader: R, mut writer: W) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut tail = TailBuffer::new(OUTPUT_TAIL_BYTES);
    let mut buf = [0u8; 8192];
    let mut forward = true;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        tail.extend(&buf[..n]);
        // Keep draining the pipe even if our own stream has gone away.
        if forward {
            if let Err(e) = writer.write_all(&buf[..n]).await {
                debug!("Stopped forwarding child output: {}", e);
                forward = false;
            }
        }
    }
    if forward {
        writer.flush().await.unwrap_or_else(|e| debug!("Flush failed: {}", e));
    }
    Ok(tail.into_string())
}

/// A byte buffer that keeps only the most recent `capacity` bytes.
#[derive(Debug)]
struct TailBuffer {
    capacity: usize,
    bytes: VecDeque<u8>,
}

impl TailBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            bytes: VecDeque::new(),
        }
    }

    fn extend(&mut self, data: &[u8]) {
        let data = if data.len() > self.capacity {
            &data[data.len() - self.capacity..]
        } else {
            data
        };
        let overflow = (self.bytes.len() + data.len()).saturating_sub(self.capacity);
        self.bytes.drain(..overflow);
        self.bytes.extend(data);
    }

    fn into_string(self) -> String {
        let bytes: Vec<u8> = self.bytes.into();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    fn never() -> Cancel {
        Box::pin(futures_util::future::pending())
    }

    fn bash(script: &str) -> ProcessSpec {
        ProcessSpec {
            program: "/bin/bash".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            env: vec!["GREETING=hello".to_string(), "PATH=/usr/bin:/bin".to_string()],
        }
    }

    #[test]
    fn tail_buffer_keeps_latest() {
        let mut tail = TailBuffer::new(4);
        tail.extend(b"ab");
        tail.extend(b"cde");
        assert_eq!(tail.into_string(), "bcde");

        let mut tail = TailBuffer::new(3);
        tail.extend(b"abcdefg");
        assert_eq!(tail.into_string(), "efg");
    }

    #[tokio::test]
    async fn captures_output_and_code() {
        let out = ExecRunner
            .run(&bash("echo $GREETING; echo oops >&2; exit 3"), never())
            .await
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[tokio::test]
    async fn environment_is_exactly_what_was_given() {
        let out = ExecRunner
            .run(&bash("echo ${HOME:-unset}"), never())
            .await
            .unwrap();
        assert_eq!(out.stdout, "unset\n");
    }

    #[tokio::test]
    async fn cancellation_terminates_child() {
        let cancel: Cancel = Box::pin(tokio::time::sleep(Duration::from_millis(200)));
        let started = std::time::Instant::now();
        let err = ExecRunner.run(&bash("sleep 30"), cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn missing_program() {
        let spec = ProcessSpec {
            program: "/nonexistent/program".to_string(),
            args: vec![],
            env: vec![],
        };
        assert!(matches!(
            ExecRunner.run(&spec, never()).await,
            Err(Error::Spawn { .. })
        ));
    }

    #[tokio::test]
    async fn dry_run_succeeds_without_running() {
        let out = DryRunRunner.run(&bash("exit 9"), never()).await.unwrap();
        assert_eq!(out.code, Some(0));
        assert!(out.stdout.is_empty());
    }
}
