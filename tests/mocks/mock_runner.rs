//! Scripted process runner
//!
//! Plays the downloader and the encoder without spawning anything. The fake
//! downloader writes the requested URL as the video payload, so every file is
//! traceable to the request that produced it; the fake encoder appends a
//! marker to its input.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use mauloader::core::error::{AppError, AppResult};
use mauloader::core::process::{ProcessResult, ProcessRunner};

pub const DOWNLOADER: &str = "fake-yt-dlp";
pub const ENCODER: &str = "fake-ffmpeg";
pub const COMPRESSED_MARKER: &str = "|compressed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    /// Exit non-zero, writing nothing
    Fail,
    /// Exit zero, writing nothing
    NoOutput,
}

#[derive(Debug, Clone)]
pub struct MockRunnerConfig {
    pub downloader: Behavior,
    pub encoder: Behavior,
    /// Upper bound of the random per-call delay
    pub max_delay_ms: u64,
}

impl Default for MockRunnerConfig {
    fn default() -> Self {
        Self {
            downloader: Behavior::Succeed,
            encoder: Behavior::Succeed,
            max_delay_ms: 0,
        }
    }
}

pub struct MockRunner {
    config: MockRunnerConfig,
    calls: Mutex<Vec<(String, Vec<String>)>>,
    invocations: AtomicUsize,
}

fn random_delay(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    let seed = u64::from(uuid::Uuid::new_v4().as_bytes()[0]);
    Duration::from_millis(seed % (max_ms + 1))
}

impl MockRunner {
    pub fn new(config: MockRunnerConfig) -> Self {
        Self {
            config,
            calls: Mutex::new(Vec::new()),
            invocations: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(MockRunnerConfig::default())
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|(program, _)| program).collect()
    }

    async fn download(&self, args: &[String]) -> AppResult<ProcessResult> {
        // [url, "-o", destination]
        let (url, destination) = (&args[0], &args[2]);
        match self.config.downloader {
            Behavior::Succeed => {
                tokio::fs::write(destination, url.as_bytes()).await?;
                Ok(finished(0, "[download] 100%"))
            }
            Behavior::Fail => Ok(finished(1, "ERROR: Unable to extract video")),
            Behavior::NoOutput => Ok(finished(0, "")),
        }
    }

    async fn encode(&self, args: &[String]) -> AppResult<ProcessResult> {
        // ["-i", src, ..., tmp]
        let (src, tmp) = (&args[1], &args[args.len() - 1]);
        match self.config.encoder {
            Behavior::Succeed => {
                let mut bytes = tokio::fs::read(src).await?;
                bytes.extend_from_slice(COMPRESSED_MARKER.as_bytes());
                tokio::fs::write(tmp, bytes).await?;
                Ok(finished(0, "video:1kB"))
            }
            Behavior::Fail => {
                tokio::fs::write(tmp, b"partial").await?;
                Ok(finished(1, "Conversion failed!"))
            }
            Behavior::NoOutput => Ok(finished(0, "")),
        }
    }
}

fn finished(code: i32, output: &str) -> ProcessResult {
    ProcessResult {
        output: output.to_string(),
        exit_code: Some(code),
        success: code == 0,
    }
}

#[async_trait]
impl ProcessRunner for MockRunner {
    async fn run(&self, program: &str, args: &[String], cancel: &CancellationToken) -> AppResult<ProcessResult> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push((program.to_string(), args.to_vec()));
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        tokio::select! {
            _ = tokio::time::sleep(random_delay(self.config.max_delay_ms)) => {}
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
        }

        match program {
            DOWNLOADER => self.download(args).await,
            ENCODER => self.encode(args).await,
            other => Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("unknown program {}", other),
            ))),
        }
    }
}
