use thiserror::Error;

use crate::download::error::VideoError;

/// Centralized error types for the application
///
/// Pipeline failures are carried by [`VideoError`]; everything else (transport,
/// HTTP, IO, process supervision) lands in one of the other variants.
#[derive(Error, Debug)]
pub enum AppError {
    /// Categorized pipeline failure
    #[error(transparent)]
    Video(#[from] VideoError),

    /// Telegram API errors (transport level)
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP status code errors
    #[error("HTTP request failed with status: {0}")]
    HttpStatus(reqwest::StatusCode),

    /// JSON decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// External process ran longer than allowed and was killed
    #[error("Process `{program}` timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    /// The request was cancelled (shutdown or caller abort)
    #[error("Operation cancelled")]
    Cancelled,
}

impl AppError {
    /// True when the error stems from cancellation at any layer.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled | AppError::Video(VideoError::Cancelled))
    }
}

/// Network-class transport errors: the request may succeed if sent again.
pub fn is_network_class(err: &teloxide::RequestError) -> bool {
    use teloxide::RequestError;
    matches!(
        err,
        RequestError::Network(_) | RequestError::Io(_) | RequestError::RetryAfter(_)
    )
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
