//! Per-request working directories.
//!
//! Every download job owns a fresh directory under the work root, so two jobs
//! in flight can never touch each other's files. Directories are removed when
//! the job finishes; the sweeper collects the ones a crash left behind.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::error::AppResult;

/// Prefix of every job directory name; the sweeper ignores anything else.
pub const JOB_DIR_PREFIX: &str = "job-";

const VIDEO_FILE: &str = "video.mp4";
const TRANSCODE_TEMP_FILE: &str = "video.compressed.mp4";

/// One in-flight acquisition and its private directory.
#[derive(Debug)]
pub struct DownloadJob {
    id: String,
    source_url: String,
    dir: PathBuf,
    cleaned: bool,
}

impl DownloadJob {
    /// Allocates a job directory `<root>/job-<tag>-<timestamp>-<uuid>`.
    ///
    /// `tag` only makes directories easier to match to log lines; uniqueness
    /// comes from the UUID.
    pub async fn create(work_root: &Path, tag: &str, source_url: &str) -> AppResult<Self> {
        let id = format!(
            "{}-{}-{}",
            sanitize_tag(tag),
            chrono::Utc::now().format("%Y%m%d%H%M%S"),
            uuid::Uuid::new_v4().simple()
        );
        let dir = work_root.join(format!("{}{}", JOB_DIR_PREFIX, id));
        fs_err::tokio::create_dir_all(&dir).await?;
        log::debug!("Job {} allocated at {}", id, dir.display());

        Ok(Self {
            id,
            source_url: source_url.to_string(),
            dir,
            cleaned: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the downloader writes the video.
    pub fn destination(&self) -> PathBuf {
        self.dir.join(VIDEO_FILE)
    }

    /// Sibling path the encoder writes to before replacing the original.
    pub fn transcode_temp(&self) -> PathBuf {
        self.dir.join(TRANSCODE_TEMP_FILE)
    }

    /// Removes the job directory and everything in it.
    pub async fn cleanup(mut self) {
        self.cleaned = true;
        match fs_err::tokio::remove_dir_all(&self.dir).await {
            Ok(()) => log::debug!("Job {} cleaned up", self.id),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to clean up job {}: {}", self.id, e),
        }
    }
}

impl Drop for DownloadJob {
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        // Aborted task: the async cleanup never ran
        let id = std::mem::take(&mut self.id);
        let dir = std::mem::take(&mut self.dir);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_abandoned(&id, &dir));
            }
            Err(_) => remove_abandoned(&id, &dir),
        }
    }
}

fn remove_abandoned(id: &str, dir: &Path) {
    match fs_err::remove_dir_all(dir) {
        Ok(()) => log::info!("Job {} dropped before completion, directory removed", id),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove directory of dropped job {}: {}", id, e),
    }
}

fn sanitize_tag(tag: &str) -> String {
    let cleaned: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(32)
        .collect();
    if cleaned.is_empty() {
        "anon".to_string()
    } else {
        cleaned
    }
}

/// Removes job directories under `root` older than `max_age`.
///
/// Returns how many directories were removed. A missing root is not an error.
pub async fn sweep_stale_jobs(root: &Path, max_age: Duration) -> AppResult<usize> {
    let mut entries = match fs_err::tokio::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(JOB_DIR_PREFIX) {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(m) => m,
            Err(e) => {
                log::debug!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if !metadata.is_dir() {
            continue;
        }
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .unwrap_or_default();
        if age < max_age {
            continue;
        }
        match fs_err::tokio::remove_dir_all(entry.path()).await {
            Ok(()) => {
                removed += 1;
                log::info!(
                    "Removed stale job directory {} (age {}s)",
                    entry.path().display(),
                    age.as_secs()
                );
            }
            Err(e) => log::warn!("Failed to remove stale job directory: {}", e),
        }
    }

    Ok(removed)
}

/// Spawns the background sweeper; it stops when `shutdown` is cancelled.
pub fn spawn_job_sweeper(
    root: PathBuf,
    interval: Duration,
    max_age: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match sweep_stale_jobs(&root, max_age).await {
                        Ok(0) => {}
                        Ok(n) => log::info!("Job sweeper removed {} stale directories", n),
                        Err(e) => log::warn!("Job sweeper failed: {}", e),
                    }
                }
                _ = shutdown.cancelled() => {
                    log::info!("Job sweeper stopped");
                    break;
                }
            }
        }
    })
}
