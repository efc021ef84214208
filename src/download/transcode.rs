//! Re-encodes downloaded videos to shrink them before upload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::error::AppError;
use crate::core::process::ProcessRunner;
use crate::core::utils::tail_for_log;
use crate::download::error::VideoError;

/// HEVC encode tuned for speed; quality is secondary for chat delivery.
pub fn build_args(src: &Path, tmp: &Path) -> Vec<String> {
    let mut args = vec!["-i".to_string(), src.to_string_lossy().into_owned()];
    args.extend(
        [
            "-vcodec",
            "libx265",
            "-crf",
            "28",
            "-tune",
            "fastdecode",
            "-preset",
            "ultrafast",
            "-threads:v",
            "1",
            "-y",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push(tmp.to_string_lossy().into_owned());
    args
}

#[derive(Clone)]
pub struct VideoTranscoder {
    runner: Arc<dyn ProcessRunner>,
    encoder_bin: String,
}

impl VideoTranscoder {
    pub fn new(runner: Arc<dyn ProcessRunner>, encoder_bin: impl Into<String>) -> Self {
        Self {
            runner,
            encoder_bin: encoder_bin.into(),
        }
    }

    /// Encodes `src` into `tmp`, then renames `tmp` over `src`.
    ///
    /// `src` is only ever replaced by a rename, so on any failure it is left
    /// exactly as it was and `tmp` is removed.
    pub async fn transcode(&self, src: &Path, tmp: &Path, cancel: &CancellationToken) -> Result<PathBuf, VideoError> {
        let outcome = self.encode(src, tmp, cancel).await;
        if outcome.is_err() {
            discard_temp(tmp).await;
        }
        outcome
    }

    async fn encode(&self, src: &Path, tmp: &Path, cancel: &CancellationToken) -> Result<PathBuf, VideoError> {
        log::info!("Compressing {}", src.display());
        let args = build_args(src, tmp);
        let result = self
            .runner
            .run(&self.encoder_bin, &args, cancel)
            .await
            .map_err(|e| match e {
                AppError::Cancelled => VideoError::Cancelled,
                other => VideoError::TranscodeFailed(format!("{}: {}", self.encoder_bin, other)),
            })?;

        if !result.success {
            log::warn!(
                "{} failed with {}: {}",
                self.encoder_bin,
                result.describe_exit(),
                tail_for_log(&result.output, 300)
            );
            return Err(VideoError::TranscodeFailed(format!(
                "{} {}: {}",
                self.encoder_bin,
                result.describe_exit(),
                result.last_line()
            )));
        }

        let produced = fs_err::tokio::metadata(tmp).await.map(|m| m.len()).unwrap_or(0);
        if produced == 0 {
            return Err(VideoError::TranscodeFailed(format!(
                "{} produced no output",
                self.encoder_bin
            )));
        }

        fs_err::tokio::rename(tmp, src)
            .await
            .map_err(|e| VideoError::TranscodeFailed(e.to_string()))?;
        log::info!("Compressed {} ({} bytes)", src.display(), produced);
        Ok(src.to_path_buf())
    }
}

async fn discard_temp(tmp: &Path) {
    match fs_err::tokio::remove_file(tmp).await {
        Ok(()) => log::debug!("Removed partial encode {}", tmp.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove partial encode: {}", e),
    }
}
