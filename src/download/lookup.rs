//! Lookup API client for watermark-free TikTok links.
//!
//! The API takes the share link as a form field and answers with a token/id
//! pair; the direct download link is derived from those two values and never
//! travels over the wire.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::core::config;
use crate::core::error::AppError;
use crate::core::utils::{cancellable, format_count};
use crate::download::error::VideoError;

/// Raw lookup response. Everything is optional so that a partial body is
/// reported as a lookup failure instead of a decode error.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    token: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    create_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    comment_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    like_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    share_count: u64,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Metadata of one remote video plus its derived download link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteVideoMetadata {
    pub token: String,
    pub id: String,
    pub author_name: String,
    pub created_time: String,
    pub comment_count: u64,
    pub like_count: u64,
    pub share_count: u64,
    pub download_link: String,
}

/// `<base>/<token>/<id>.mp4`
pub fn build_download_link(download_base: &str, token: &str, id: &str) -> String {
    format!("{}/{}/{}.mp4", download_base.trim_end_matches('/'), token, id)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RemoteVideoMetadata {
    /// Parses a lookup body. A missing or empty token/id is a lookup failure,
    /// never a half-built link.
    pub fn from_json(body: &str, download_base: &str) -> Result<Self, VideoError> {
        let response: LookupResponse = serde_json::from_str(body)
            .map_err(|e| VideoError::LookupFailed(format!("malformed lookup response: {}", e)))?;

        if response.success == Some(false) {
            return Err(VideoError::LookupFailed(
                response
                    .message
                    .unwrap_or_else(|| "lookup API reported failure".to_string()),
            ));
        }

        let token = non_empty(response.token)
            .ok_or_else(|| VideoError::LookupFailed("lookup response has no token".to_string()))?;
        let id =
            non_empty(response.id).ok_or_else(|| VideoError::LookupFailed("lookup response has no id".to_string()))?;

        Ok(Self {
            download_link: build_download_link(download_base, &token, &id),
            token,
            id,
            author_name: response.author_name.unwrap_or_default(),
            created_time: response.create_time.unwrap_or_default(),
            comment_count: response.comment_count,
            like_count: response.like_count,
            share_count: response.share_count,
        })
    }

    /// Video caption: author and date, then likes, comments and shares.
    pub fn caption(&self) -> String {
        format!(
            "{} - {}\n❤️: {}\n💬: {}\n🔗: {}",
            self.author_name,
            self.created_time,
            format_count(self.like_count),
            format_count(self.comment_count),
            format_count(self.share_count)
        )
    }
}

/// Talks to the lookup endpoint.
#[derive(Debug, Clone)]
pub struct LookupClient {
    http: reqwest::Client,
    endpoint: String,
    download_base: String,
}

impl LookupClient {
    pub fn new(endpoint: impl Into<String>, download_base: impl Into<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config::network::api_timeout())
            .user_agent(config::lookup::USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            download_base: download_base.into(),
        })
    }

    /// Client for the endpoints configured through the environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(config::LOOKUP_API_URL.as_str(), config::LOOKUP_DOWNLOAD_BASE.as_str())
    }

    /// Looks up `source_url`. Every failure other than cancellation becomes
    /// [`VideoError::LookupFailed`].
    pub async fn lookup(&self, source_url: &str, cancel: &CancellationToken) -> Result<RemoteVideoMetadata, VideoError> {
        let body = cancellable(cancel, async {
            let response = self
                .http
                .post(&self.endpoint)
                .form(&[("url", source_url)])
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(AppError::HttpStatus(response.status()));
            }
            Ok(response.text().await?)
        })
        .await
        .map_err(|e| match e {
            AppError::Cancelled => VideoError::Cancelled,
            other => VideoError::LookupFailed(other.to_string()),
        })?;

        let metadata = RemoteVideoMetadata::from_json(&body, &self.download_base)?;
        log::info!(
            "Lookup resolved {} -> {} (author: {})",
            source_url,
            metadata.download_link,
            metadata.author_name
        );
        Ok(metadata)
    }
}
