//! Classifies inbound text into a route.
//!
//! Pure function of the message text: no network, no process, no state.

use crate::core::config::sources;

/// Where a video link comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Short links resolved through the lookup API
    TikTok,
    /// Links fetched with the external downloader
    Reddit,
}

impl SourceKind {
    pub fn prefix(self) -> &'static str {
        match self {
            SourceKind::TikTok => sources::TIKTOK_PREFIX,
            SourceKind::Reddit => sources::REDDIT_PREFIX,
        }
    }

    pub fn command(self) -> &'static str {
        match self {
            SourceKind::TikTok => "/tiktok",
            SourceKind::Reddit => "/reddit",
        }
    }

    /// MarkdownV2 usage line for this pipeline.
    pub fn usage(self) -> String {
        format!("Usage: {} `[url]`", self.command())
    }

    fn matches(self, url: &str) -> bool {
        url.starts_with(self.prefix())
    }
}

/// A validated video link and its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub kind: SourceKind,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Video(VideoRequest),
    /// Command for `kind` without a usable link
    InvalidUrl(SourceKind),
    Photo,
    Joke,
    Usage,
}

/// General usage text (MarkdownV2).
pub const USAGE: &str = "Usage:\n\
/tiktok `[url]`   `TikTok video without watermark`\n\
/reddit `[url]`   `Reddit video`\n\
/mau              `Sends a photo`\n\
/chuck            `Chuck Norris joke`\n";

/// Classifies `text` into exactly one route.
pub fn classify(text: &str) -> Route {
    let trimmed = text.trim();

    for kind in [SourceKind::TikTok, SourceKind::Reddit] {
        if kind.matches(trimmed) {
            return Route::Video(VideoRequest {
                kind,
                url: trimmed.to_string(),
            });
        }
    }

    let mut parts = trimmed.split_whitespace();
    let Some(command) = parts.next().and_then(command_name) else {
        return Route::Usage;
    };

    match command.as_str() {
        "tiktok" => link_argument(SourceKind::TikTok, parts.next()),
        "reddit" => link_argument(SourceKind::Reddit, parts.next()),
        "mau" | "photo" => Route::Photo,
        "chuck" => Route::Joke,
        _ => Route::Usage,
    }
}

/// `/Cmd@SomeBot` -> `cmd`
fn command_name(token: &str) -> Option<String> {
    let name = token.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    if name.is_empty() {
        None
    } else {
        Some(name.to_ascii_lowercase())
    }
}

fn link_argument(kind: SourceKind, arg: Option<&str>) -> Route {
    match arg {
        Some(url) if kind.matches(url) => Route::Video(VideoRequest {
            kind,
            url: url.to_string(),
        }),
        _ => Route::InvalidUrl(kind),
    }
}
