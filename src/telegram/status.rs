//! Progress message for multi-stage requests.
//!
//! One message per request: posted at the first stage, edited on each later
//! stage, deleted exactly once when the request ends. Every chat call here is
//! best-effort; a failure is logged and the pipeline carries on.
//!
//! Once the request is cancelled, edits are dropped and the final delete gets a
//! short grace period instead of the full retry budget.

use std::sync::Arc;
use teloxide::types::{ChatId, MessageId};
use tokio_util::sync::CancellationToken;

use crate::core::config;
use crate::core::error::AppError;
use crate::core::utils::cancellable;
use crate::telegram::sink::{ChatSink, TextFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Downloading,
    Compressing,
    Uploading,
}

impl Stage {
    pub fn text(self) -> &'static str {
        match self {
            Stage::Downloading => "Downloading…",
            Stage::Compressing => "Compressing…",
            Stage::Uploading => "Uploading…",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    NotStarted,
    Posted,
    Edited,
    Deleted,
}

pub struct StatusMessenger {
    sink: Arc<dyn ChatSink>,
    chat: ChatId,
    message: Option<MessageId>,
    state: StatusState,
    cancel: CancellationToken,
}

impl StatusMessenger {
    pub fn new(sink: Arc<dyn ChatSink>, chat: ChatId) -> Self {
        Self {
            sink,
            chat,
            message: None,
            state: StatusState::NotStarted,
            cancel: CancellationToken::new(),
        }
    }

    /// Ties the messenger to the request's cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> StatusState {
        self.state
    }

    pub fn message_id(&self) -> Option<MessageId> {
        self.message
    }

    /// Announces `stage`: posts the message the first time, edits it after.
    pub async fn advance(&mut self, stage: Stage) {
        match (self.state, self.message) {
            (StatusState::Deleted, _) => {
                log::debug!("Status for chat {} already finished, ignoring {:?}", self.chat, stage);
            }
            (StatusState::Posted | StatusState::Edited, Some(_)) if self.cancel.is_cancelled() => {
                log::debug!("Request in chat {} cancelled, skipping {:?}", self.chat, stage);
            }
            (StatusState::Posted | StatusState::Edited, Some(id)) => {
                match cancellable(&self.cancel, self.sink.edit_text(self.chat, id, stage.text())).await {
                    Ok(()) => self.state = StatusState::Edited,
                    Err(AppError::Cancelled) => {
                        log::debug!("Status edit in chat {} abandoned on cancellation", self.chat)
                    }
                    Err(e) => log::warn!("Failed to edit status message in chat {}: {}", self.chat, e),
                }
            }
            _ => match self.sink.send_text(self.chat, stage.text(), TextFormat::Plain).await {
                Ok(id) => {
                    self.message = Some(id);
                    self.state = StatusState::Posted;
                }
                Err(e) => log::warn!("Failed to post status message in chat {}: {}", self.chat, e),
            },
        }
    }

    /// Deletes the status message. Safe to call more than once.
    pub async fn finish(&mut self) {
        if self.state == StatusState::Deleted {
            return;
        }
        self.state = StatusState::Deleted;
        let Some(id) = self.message.take() else {
            return;
        };
        let delete = self.sink.delete_message(self.chat, id);
        let result = if self.cancel.is_cancelled() {
            match tokio::time::timeout(config::retry::cancelled_cleanup(), delete).await {
                Ok(result) => result,
                Err(_) => {
                    log::warn!("Gave up deleting status message {} in chat {} after shutdown", id.0, self.chat);
                    return;
                }
            }
        } else {
            delete.await
        };
        if let Err(e) = result {
            log::warn!("Failed to delete status message in chat {}: {}", self.chat, e);
        }
    }
}

impl Drop for StatusMessenger {
    fn drop(&mut self) {
        if self.state == StatusState::Deleted {
            return;
        }
        let Some(id) = self.message.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let sink = Arc::clone(&self.sink);
                let chat = self.chat;
                handle.spawn(async move {
                    if let Err(e) = sink.delete_message(chat, id).await {
                        log::warn!("Failed to delete abandoned status message in chat {}: {}", chat, e);
                    }
                });
            }
            Err(_) => log::warn!("Status message {} in chat {} left behind: no runtime", id.0, self.chat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{AppError, AppResult};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_post: AtomicBool,
        fail_edit: AtomicBool,
        fail_delete: AtomicBool,
        /// Milliseconds every edit and delete takes
        latency_ms: AtomicU64,
    }

    fn refused() -> AppError {
        AppError::Io(std::io::Error::other("refused"))
    }

    #[async_trait]
    impl ChatSink for Recorder {
        async fn send_text(&self, _chat: ChatId, text: &str, _format: TextFormat) -> AppResult<MessageId> {
            self.calls.lock().unwrap().push(format!("post:{}", text));
            if self.fail_post.load(Ordering::SeqCst) {
                return Err(refused());
            }
            Ok(MessageId(7))
        }

        async fn send_photo(&self, _: ChatId, _: &Path, _: &str) -> AppResult<MessageId> {
            unreachable!()
        }

        async fn send_video_url(&self, _: ChatId, _: &str, _: &str) -> AppResult<MessageId> {
            unreachable!()
        }

        async fn send_video_file(&self, _: ChatId, _: &Path, _: Option<&str>) -> AppResult<MessageId> {
            unreachable!()
        }

        async fn edit_text(&self, _chat: ChatId, message: MessageId, text: &str) -> AppResult<()> {
            self.calls.lock().unwrap().push(format!("edit:{}:{}", message.0, text));
            self.lag().await;
            if self.fail_edit.load(Ordering::SeqCst) {
                return Err(refused());
            }
            Ok(())
        }

        async fn delete_message(&self, _chat: ChatId, message: MessageId) -> AppResult<()> {
            self.calls.lock().unwrap().push(format!("delete:{}", message.0));
            self.lag().await;
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(refused());
            }
            Ok(())
        }
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn lag(&self) {
            let ms = self.latency_ms.load(Ordering::SeqCst);
            if ms > 0 {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let sink = Arc::new(Recorder::default());
        let mut status = StatusMessenger::new(sink.clone(), ChatId(1));
        assert_eq!(status.state(), StatusState::NotStarted);

        status.advance(Stage::Downloading).await;
        assert_eq!(status.state(), StatusState::Posted);
        status.advance(Stage::Compressing).await;
        status.advance(Stage::Uploading).await;
        assert_eq!(status.state(), StatusState::Edited);
        status.finish().await;
        status.finish().await;
        assert_eq!(status.state(), StatusState::Deleted);

        assert_eq!(
            sink.calls(),
            vec![
                "post:Downloading…",
                "edit:7:Compressing…",
                "edit:7:Uploading…",
                "delete:7"
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_edit_does_not_stop_pipeline() {
        let sink = Arc::new(Recorder::default());
        sink.fail_edit.store(true, Ordering::SeqCst);
        let mut status = StatusMessenger::new(sink.clone(), ChatId(1));

        status.advance(Stage::Downloading).await;
        status.advance(Stage::Uploading).await;
        status.finish().await;

        assert_eq!(status.state(), StatusState::Deleted);
        assert_eq!(sink.calls(), vec!["post:Downloading…", "edit:7:Uploading…", "delete:7"]);
    }

    #[tokio::test]
    async fn test_failed_delete_is_not_retried() {
        let sink = Arc::new(Recorder::default());
        sink.fail_delete.store(true, Ordering::SeqCst);
        let mut status = StatusMessenger::new(sink.clone(), ChatId(1));

        status.advance(Stage::Downloading).await;
        status.finish().await;
        drop(status);
        tokio::task::yield_now().await;

        assert_eq!(sink.calls(), vec!["post:Downloading…", "delete:7"]);
    }

    #[tokio::test]
    async fn test_failed_post_retries_on_next_stage() {
        let sink = Arc::new(Recorder::default());
        sink.fail_post.store(true, Ordering::SeqCst);
        let mut status = StatusMessenger::new(sink.clone(), ChatId(1));

        status.advance(Stage::Downloading).await;
        assert_eq!(status.state(), StatusState::NotStarted);

        sink.fail_post.store(false, Ordering::SeqCst);
        status.advance(Stage::Uploading).await;
        assert_eq!(status.state(), StatusState::Posted);
        status.finish().await;

        assert_eq!(
            sink.calls(),
            vec!["post:Downloading…", "post:Uploading…", "delete:7"]
        );
    }

    #[tokio::test]
    async fn test_finish_without_post_is_noop() {
        let sink = Arc::new(Recorder::default());
        let mut status = StatusMessenger::new(sink.clone(), ChatId(1));
        status.finish().await;
        assert_eq!(status.state(), StatusState::Deleted);
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drop_without_finish_deletes() {
        let sink = Arc::new(Recorder::default());
        let mut status = StatusMessenger::new(sink.clone(), ChatId(1));
        status.advance(Stage::Downloading).await;
        drop(status);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(sink.calls(), vec!["post:Downloading…", "delete:7"]);
    }

    #[tokio::test]
    async fn test_advance_after_finish_is_ignored() {
        let sink = Arc::new(Recorder::default());
        let mut status = StatusMessenger::new(sink.clone(), ChatId(1));
        status.advance(Stage::Downloading).await;
        status.finish().await;
        status.advance(Stage::Uploading).await;
        assert_eq!(sink.calls(), vec!["post:Downloading…", "delete:7"]);
    }

    #[tokio::test]
    async fn test_edits_skipped_after_cancellation() {
        let sink = Arc::new(Recorder::default());
        let cancel = CancellationToken::new();
        let mut status = StatusMessenger::new(sink.clone(), ChatId(1)).with_cancel(cancel.clone());

        status.advance(Stage::Downloading).await;
        cancel.cancel();
        status.advance(Stage::Compressing).await;
        status.finish().await;

        assert_eq!(status.state(), StatusState::Deleted);
        assert_eq!(sink.calls(), vec!["post:Downloading…", "delete:7"]);
    }

    #[tokio::test]
    async fn test_slow_edit_abandoned_on_cancellation() {
        let sink = Arc::new(Recorder::default());
        sink.latency_ms.store(60_000, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        let mut status = StatusMessenger::new(sink.clone(), ChatId(1)).with_cancel(cancel.clone());
        status.advance(Stage::Downloading).await;

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });
        tokio::time::timeout(Duration::from_secs(5), status.advance(Stage::Uploading))
            .await
            .unwrap();
        assert_eq!(status.state(), StatusState::Posted);
    }

    #[tokio::test]
    async fn test_delete_after_cancellation_is_bounded() {
        let sink = Arc::new(Recorder::default());
        let cancel = CancellationToken::new();
        let mut status = StatusMessenger::new(sink.clone(), ChatId(1)).with_cancel(cancel.clone());
        status.advance(Stage::Downloading).await;

        sink.latency_ms.store(60_000, Ordering::SeqCst);
        cancel.cancel();
        let grace = config::retry::cancelled_cleanup() + Duration::from_secs(5);
        tokio::time::timeout(grace, status.finish()).await.unwrap();

        assert_eq!(status.state(), StatusState::Deleted);
        assert_eq!(sink.calls(), vec!["post:Downloading…", "delete:7"]);
    }
}
