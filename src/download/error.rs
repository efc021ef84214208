use std::fmt;

/// Structured error type for the video pipelines.
///
/// Each variant maps to one user-visible outcome; the handler turns them into
/// replies and never lets them escape the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    /// Command argument missing or link with an unsupported prefix
    InvalidUrl(String),
    /// Lookup API unreachable, non-2xx, malformed, or missing token/id
    LookupFailed(String),
    /// Downloader exited non-zero or produced no file
    AcquisitionFailed(String),
    /// Encoder exited non-zero or produced no file
    TranscodeFailed(String),
    /// Sending the video to the chat failed
    DeliveryFailed(String),
    /// Request aborted before completion
    Cancelled,
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::InvalidUrl(msg) => write!(f, "invalid url: {}", msg),
            VideoError::LookupFailed(msg) => write!(f, "lookup failed: {}", msg),
            VideoError::AcquisitionFailed(msg) => write!(f, "acquisition failed: {}", msg),
            VideoError::TranscodeFailed(msg) => write!(f, "transcode failed: {}", msg),
            VideoError::DeliveryFailed(msg) => write!(f, "delivery failed: {}", msg),
            VideoError::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for VideoError {}

impl VideoError {
    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            VideoError::InvalidUrl(_) => "invalid_url",
            VideoError::LookupFailed(_) => "lookup",
            VideoError::AcquisitionFailed(_) => "acquisition",
            VideoError::TranscodeFailed(_) => "transcode",
            VideoError::DeliveryFailed(_) => "delivery",
            VideoError::Cancelled => "cancelled",
        }
    }

    /// Text sent back to the chat for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            VideoError::InvalidUrl(_) => "That link doesn't look right.",
            VideoError::LookupFailed(_) => "😿 Couldn't look up that TikTok, please try again later.",
            VideoError::AcquisitionFailed(_) => "😿 Failed to download the video.",
            VideoError::TranscodeFailed(_) => "😿 Failed to compress the video.",
            VideoError::DeliveryFailed(_) => "😿 Failed to upload the video, it may be too large.",
            VideoError::Cancelled => "The request was cancelled.",
        }
    }
}
