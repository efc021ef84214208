//! Process execution with timeout and cancellation support
//!
//! Runs external tools (yt-dlp, ffmpeg) and captures their output. Both pipes
//! are drained while the child runs, so a chatty process can never fill a pipe
//! buffer and stall waiting for us.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::core::config;
use crate::core::error::{AppError, AppResult};

/// Outcome of one external process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// stdout followed by stderr, lossily decoded
    pub output: String,
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl ProcessResult {
    pub fn from_status(status: ExitStatus, output: String) -> Self {
        Self {
            output,
            exit_code: status.code(),
            success: status.success(),
        }
    }

    /// Short description of the exit, for error messages.
    pub fn describe_exit(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    /// Last non-empty output line, usually the tool's error message.
    pub fn last_line(&self) -> &str {
        self.output
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
    }
}

/// Seam between the pipelines and the operating system.
///
/// A non-zero exit is not an error at this level; the caller decides whether it
/// is fatal. Errors are reserved for spawn failures, timeouts and cancellation.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], cancel: &CancellationToken) -> AppResult<ProcessResult>;
}

/// Runs real processes through `tokio::process`.
#[derive(Debug, Clone)]
pub struct SystemProcessRunner {
    timeout: Duration,
}

impl SystemProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemProcessRunner {
    fn default() -> Self {
        Self::new(config::process::timeout())
    }
}

enum Outcome {
    Finished(std::io::Result<(Vec<u8>, Vec<u8>, ExitStatus)>),
    TimedOut,
    Cancelled,
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, program: &str, args: &[String], cancel: &CancellationToken) -> AppResult<ProcessResult> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        log::debug!("Spawning {} {:?}", program, args);
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let outcome = {
            let run = async {
                let (out, err, status) = tokio::join!(drain(stdout), drain(stderr), child.wait());
                Ok::<_, std::io::Error>((out?, err?, status?))
            };
            tokio::select! {
                res = tokio::time::timeout(self.timeout, run) => match res {
                    Ok(finished) => Outcome::Finished(finished),
                    Err(_) => Outcome::TimedOut,
                },
                _ = cancel.cancelled() => Outcome::Cancelled,
            }
        };

        match outcome {
            Outcome::Finished(res) => {
                let (out, err, status) = res?;
                let mut output = String::from_utf8_lossy(&out).into_owned();
                output.push_str(&String::from_utf8_lossy(&err));
                let result = ProcessResult::from_status(status, output);
                log::debug!("{} finished with {}", program, result.describe_exit());
                Ok(result)
            }
            Outcome::TimedOut => {
                log::warn!("{} timed out after {}s, killing", program, self.timeout.as_secs());
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill {}: {}", program, e);
                }
                Err(AppError::Timeout {
                    program: program.to_string(),
                    secs: self.timeout.as_secs(),
                })
            }
            Outcome::Cancelled => {
                log::info!("{} cancelled, killing", program);
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill {}: {}", program, e);
                }
                Err(AppError::Cancelled)
            }
        }
    }
}
