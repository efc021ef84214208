use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::core::error::{AppError, AppResult};

/// Runs `fut` unless `cancel` fires first; the future is dropped on cancellation.
pub async fn cancellable<T>(cancel: &CancellationToken, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
    tokio::select! {
        res = fut => res,
        _ = cancel.cancelled() => Err(AppError::Cancelled),
    }
}

/// Formats a count with `,` thousands separators.
///
/// # Example
///
/// ```
/// use mauloader::core::utils::format_count;
///
/// assert_eq!(format_count(1234567), "1,234,567");
/// assert_eq!(format_count(10), "10");
/// ```
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// Shortens process output for a single log line.
///
/// Keeps the tail, which is where yt-dlp and ffmpeg put their errors.
pub fn tail_for_log(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(count - max_chars).collect();
    format!("…{}", tail)
}
