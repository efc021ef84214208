//! Chuck Norris joke client for /chuck.
//!
//! Calls a public JSON endpoint that answers with `{"value": "..."}`.

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::utils::cancellable;

#[derive(Deserialize)]
struct JokeResponse {
    value: String,
}

/// Fetches one random joke per call.
#[derive(Debug, Clone)]
pub struct JokeClient {
    http: reqwest::Client,
    endpoint: String,
}

impl JokeClient {
    pub fn new(endpoint: impl Into<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config::network::api_timeout())
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Client for the endpoint configured through `JOKE_API_URL`.
    pub fn from_env() -> AppResult<Self> {
        Self::new(config::JOKE_API_URL.as_str())
    }

    pub async fn random(&self, cancel: &CancellationToken) -> AppResult<String> {
        cancellable(cancel, async {
            let response = self.http.get(&self.endpoint).send().await?;
            if !response.status().is_success() {
                return Err(AppError::HttpStatus(response.status()));
            }
            let joke: JokeResponse = serde_json::from_str(&response.text().await?)?;
            Ok(joke.value)
        })
        .await
    }
}
