//! Test environment wiring the real handler to fakes

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use teloxide::types::{ChatId, MessageId};
use tokio_util::sync::CancellationToken;

use mauloader::core::config::PipelineSettings;
use mauloader::core::joke::JokeClient;
use mauloader::download::{LookupClient, VideoPipeline};
use mauloader::telegram::{handle_incoming, HandlerDeps, IncomingMessage};

use super::recorder::RecordingSink;
use crate::mocks::{MockRunner, MockRunnerConfig, DOWNLOADER, ENCODER};

pub const DOWNLOAD_BASE: &str = "https://tikmate.app/download";

/// Base URL nothing listens on; any request to it fails fast.
pub const UNREACHABLE_API: &str = "http://127.0.0.1:9";

pub struct TestEnvironment {
    pub work: TempDir,
    pub sink: Arc<RecordingSink>,
    pub runner: Arc<MockRunner>,
    pub deps: HandlerDeps,
}

impl TestEnvironment {
    /// `api_base` hosts both `/api/lookup` and `/jokes/random`.
    pub fn new(runner: MockRunnerConfig, compress: bool, api_base: &str) -> Self {
        let work = TempDir::new().unwrap();
        let mut settings = PipelineSettings::with_work_root(work.path().join("jobs")).compress(compress);
        settings.downloader_bin = DOWNLOADER.to_string();
        settings.encoder_bin = ENCODER.to_string();
        settings.photo_path = work.path().join("mau.jpg");
        std::fs::write(&settings.photo_path, b"jpeg").unwrap();

        let runner = Arc::new(MockRunner::new(runner));
        let lookup = LookupClient::new(format!("{}/api/lookup", api_base), DOWNLOAD_BASE).unwrap();
        let pipeline = Arc::new(VideoPipeline::new(Arc::new(settings), lookup, runner.clone()));
        let jokes = JokeClient::new(format!("{}/jokes/random", api_base)).unwrap();

        Self {
            work,
            sink: Arc::new(RecordingSink::new()),
            runner,
            deps: HandlerDeps::new(pipeline, jokes, CancellationToken::new()),
        }
    }

    pub fn offline(runner: MockRunnerConfig, compress: bool) -> Self {
        Self::new(runner, compress, UNREACHABLE_API)
    }

    /// Delivers `text` from `chat` through the production handler.
    pub async fn send(&self, chat: i64, text: &str) {
        self.send_as(chat, 1, text).await;
    }

    pub async fn send_as(&self, chat: i64, message_id: i32, text: &str) {
        let msg = IncomingMessage::new(ChatId(chat), MessageId(message_id), text);
        handle_incoming(&self.deps, self.sink.clone(), msg).await;
    }

    pub fn photo_path(&self) -> PathBuf {
        self.work.path().join("mau.jpg")
    }

    /// Job directories still present under the work root.
    pub fn leftover_jobs(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.work.path().join("jobs")) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}
