use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Log verbosity (`error`, `warn`, `info`, `debug`, `trace`, `off`)
/// Read from RUST_LOG environment variable
/// Default: info
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()));

/// Whether Reddit-style downloads are re-encoded before upload
/// Read from COMPRESS_VIDEO environment variable ("1", "true", "yes", "on")
/// Default: false
pub static COMPRESS_VIDEO: Lazy<bool> = Lazy::new(|| {
    env::var("COMPRESS_VIDEO")
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
});

/// Root directory under which every download job gets its own working directory
/// Read from WORK_DIR environment variable
/// Default: Files/Reddit
pub static WORK_DIR: Lazy<String> = Lazy::new(|| env::var("WORK_DIR").unwrap_or_else(|_| "Files/Reddit".to_string()));

/// Photo sent in reply to /mau
/// Read from MAU_PHOTO_PATH environment variable
pub static MAU_PHOTO_PATH: Lazy<String> =
    Lazy::new(|| env::var("MAU_PHOTO_PATH").unwrap_or_else(|_| "Files/mau.jpg".to_string()));

/// Downloader binary used for Reddit-style videos
/// Read from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Encoder binary used for compression
/// Read from FFMPEG_BIN environment variable or defaults to "ffmpeg"
pub static FFMPEG_BIN: Lazy<String> = Lazy::new(|| env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()));

/// Lookup API endpoint for watermark-free TikTok links
pub static LOOKUP_API_URL: Lazy<String> =
    Lazy::new(|| env::var("LOOKUP_API_URL").unwrap_or_else(|_| lookup::DEFAULT_API_URL.to_string()));

/// Base URL the direct download link is built from
pub static LOOKUP_DOWNLOAD_BASE: Lazy<String> =
    Lazy::new(|| env::var("LOOKUP_DOWNLOAD_BASE").unwrap_or_else(|_| lookup::DEFAULT_DOWNLOAD_BASE.to_string()));

/// Joke API endpoint for /chuck
pub static JOKE_API_URL: Lazy<String> =
    Lazy::new(|| env::var("JOKE_API_URL").unwrap_or_else(|_| "https://api.chucknorris.io/jokes/random".to_string()));

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Source link prefixes used by the router
pub mod sources {
    /// Short-link prefix of the TikTok-like source
    pub const TIKTOK_PREFIX: &str = "https://vm.tiktok.com/";

    /// Link prefix of the Reddit-like source
    pub const REDDIT_PREFIX: &str = "https://www.reddit.com/";
}

/// Lookup API wire constants
pub mod lookup {
    pub const DEFAULT_API_URL: &str = "https://api.tikmate.app/api/lookup";

    pub const DEFAULT_DOWNLOAD_BASE: &str = "https://tikmate.app/download";

    /// The lookup API rejects requests without a browser user agent
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/105.0.0.0 Safari/537.36";
}

/// External process configuration
pub mod process {
    use super::Duration;

    /// Upper bound for a single downloader or encoder run (in seconds)
    pub const TIMEOUT_SECS: u64 = 600;

    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }
}

/// Retry configuration
pub mod retry {
    use super::Duration;

    /// Attempts for a chat-platform call that fails with a network-class error
    pub const MAX_TRANSPORT_ATTEMPTS: u32 = 3;

    /// Fixed cooldown after a network-class transport error (in seconds)
    pub const TRANSPORT_BACKOFF_SECS: u64 = 2;

    pub fn transport_backoff() -> Duration {
        Duration::from_secs(TRANSPORT_BACKOFF_SECS)
    }

    /// Upper bound on a flood-wait delay requested by the platform (in seconds)
    pub const MAX_RETRY_AFTER_SECS: u64 = 60;

    pub fn max_retry_after() -> Duration {
        Duration::from_secs(MAX_RETRY_AFTER_SECS)
    }

    /// How long a cancelled request may still spend deleting its status message
    pub const CANCELLED_CLEANUP_SECS: u64 = 5;

    pub fn cancelled_cleanup() -> Duration {
        Duration::from_secs(CANCELLED_CLEANUP_SECS)
    }

    /// Maximum number of retries for dispatcher reconnection
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Base for exponential backoff calculation
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
}

/// Job directory housekeeping
pub mod jobs {
    use super::Duration;

    /// How often the sweeper looks for orphaned job directories (in seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 600; // 10 minutes

    /// Job directories older than this are considered orphaned (in seconds)
    pub const MAX_AGE_SECS: u64 = 3600; // 1 hour

    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }

    pub fn max_age() -> Duration {
        Duration::from_secs(MAX_AGE_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for outgoing HTTP requests (in seconds)
    /// Large because video uploads go through the same client
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Timeout for small JSON API calls (lookup, jokes)
    pub const API_TIMEOUT_SECS: u64 = 20;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    pub fn api_timeout() -> Duration {
        Duration::from_secs(API_TIMEOUT_SECS)
    }
}

/// Snapshot of everything a request pipeline needs.
///
/// Built once at startup and handed to each request explicitly, so no handler
/// reads ambient configuration mid-flight.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Re-encode Reddit-style downloads before upload
    pub compress_video: bool,
    /// Root of the per-job working directories
    pub work_root: PathBuf,
    /// Photo for /mau
    pub photo_path: PathBuf,
    pub downloader_bin: String,
    pub encoder_bin: String,
}

impl PipelineSettings {
    /// Reads the settings from the environment-backed statics.
    pub fn from_env() -> Self {
        Self {
            compress_video: *COMPRESS_VIDEO,
            work_root: PathBuf::from(shellexpand::tilde(WORK_DIR.as_str()).to_string()),
            photo_path: PathBuf::from(shellexpand::tilde(MAU_PHOTO_PATH.as_str()).to_string()),
            downloader_bin: YTDL_BIN.clone(),
            encoder_bin: FFMPEG_BIN.clone(),
        }
    }

    /// Settings rooted at `work_root` with the default tool names.
    pub fn with_work_root(work_root: impl Into<PathBuf>) -> Self {
        Self {
            compress_video: false,
            work_root: work_root.into(),
            photo_path: PathBuf::from("Files/mau.jpg"),
            downloader_bin: "yt-dlp".to_string(),
            encoder_bin: "ffmpeg".to_string(),
        }
    }

    #[must_use]
    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress_video = enabled;
        self
    }
}
