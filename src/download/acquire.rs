//! Downloads Reddit-style videos with an external downloader.

use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::error::AppError;
use crate::core::process::ProcessRunner;
use crate::core::utils::tail_for_log;
use crate::download::error::VideoError;
use crate::download::job::DownloadJob;

/// Runs the downloader for one job: `<bin> <url> -o <destination>`.
#[derive(Clone)]
pub struct VideoAcquirer {
    runner: Arc<dyn ProcessRunner>,
    downloader_bin: String,
}

impl VideoAcquirer {
    pub fn new(runner: Arc<dyn ProcessRunner>, downloader_bin: impl Into<String>) -> Self {
        Self {
            runner,
            downloader_bin: downloader_bin.into(),
        }
    }

    /// Downloader arguments for `url` written to `destination`.
    pub fn build_args(url: &str, destination: &std::path::Path) -> Vec<String> {
        vec![
            url.to_string(),
            "-o".to_string(),
            destination.to_string_lossy().into_owned(),
        ]
    }

    /// Downloads the job's video into its destination path and returns it.
    ///
    /// Only this job's own file is replaced. A non-zero exit or a missing or
    /// empty output file is an [`VideoError::AcquisitionFailed`].
    pub async fn acquire(&self, job: &DownloadJob, cancel: &CancellationToken) -> Result<PathBuf, VideoError> {
        let destination = job.destination();

        match fs_err::tokio::remove_file(&destination).await {
            Ok(()) => log::debug!("Job {}: removed previous {}", job.id(), destination.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(VideoError::AcquisitionFailed(e.to_string())),
        }

        log::info!("Job {}: downloading {}", job.id(), job.source_url());
        let args = Self::build_args(job.source_url(), &destination);
        let result = self
            .runner
            .run(&self.downloader_bin, &args, cancel)
            .await
            .map_err(|e| match e {
                AppError::Cancelled => VideoError::Cancelled,
                other => VideoError::AcquisitionFailed(format!("{}: {}", self.downloader_bin, other)),
            })?;

        log::info!(
            "Job {}: {} finished with {}: {}",
            job.id(),
            self.downloader_bin,
            result.describe_exit(),
            tail_for_log(&result.output, 300)
        );

        if !result.success {
            return Err(VideoError::AcquisitionFailed(format!(
                "{} {}: {}",
                self.downloader_bin,
                result.describe_exit(),
                result.last_line()
            )));
        }

        match fs_err::tokio::metadata(&destination).await {
            Ok(meta) if meta.len() > 0 => Ok(destination),
            Ok(_) => Err(VideoError::AcquisitionFailed(format!(
                "{} produced an empty file",
                self.downloader_bin
            ))),
            Err(_) => Err(VideoError::AcquisitionFailed(format!(
                "{} exited successfully but produced no file",
                self.downloader_bin
            ))),
        }
    }
}
