//! Outbound chat operations used by the pipelines.
//!
//! [`ChatSink`] is the only way the pipelines talk to the chat platform, so
//! tests can swap in a recording fake. The [`Bot`] implementation retries
//! network-class failures with a fixed backoff.

use async_trait::async_trait;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, MessageId, ParseMode, ReplyMarkup};

use crate::core::error::AppResult;
use crate::core::retry::RetryPolicy;
use crate::telegram::Bot;

/// How the text of a message is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    MarkdownV2,
}

#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str, format: TextFormat) -> AppResult<MessageId>;

    /// Sends a local photo file.
    async fn send_photo(&self, chat: ChatId, path: &Path, caption: &str) -> AppResult<MessageId>;

    /// Sends a video the platform fetches from `url` itself.
    async fn send_video_url(&self, chat: ChatId, url: &str, caption: &str) -> AppResult<MessageId>;

    /// Uploads a local video file.
    async fn send_video_file(&self, chat: ChatId, path: &Path, caption: Option<&str>) -> AppResult<MessageId>;

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> AppResult<()>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> AppResult<()>;

    /// Shows a transient "uploading…" style indicator.
    async fn send_chat_action(&self, _chat: ChatId, _action: ChatAction) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ChatSink for Bot {
    async fn send_text(&self, chat: ChatId, text: &str, format: TextFormat) -> AppResult<MessageId> {
        let msg = RetryPolicy::default()
            .run("send_message", || async move {
                let mut request = self.send_message(chat, text).reply_markup(ReplyMarkup::kb_remove());
                if format == TextFormat::MarkdownV2 {
                    request = request.parse_mode(ParseMode::MarkdownV2);
                }
                request.await
            })
            .await?;
        Ok(msg.id)
    }

    async fn send_photo(&self, chat: ChatId, path: &Path, caption: &str) -> AppResult<MessageId> {
        let msg = RetryPolicy::default()
            .run("send_photo", || async move {
                Requester::send_photo(self, chat, InputFile::file(path.to_path_buf()))
                    .caption(caption)
                    .await
            })
            .await?;
        Ok(msg.id)
    }

    async fn send_video_url(&self, chat: ChatId, url: &str, caption: &str) -> AppResult<MessageId> {
        let url = url::Url::parse(url)?;
        let url = &url;
        let msg = RetryPolicy::default()
            .run("send_video", || async move {
                self.send_video(chat, InputFile::url(url.clone()))
                    .caption(caption)
                    .supports_streaming(true)
                    .await
            })
            .await?;
        Ok(msg.id)
    }

    async fn send_video_file(&self, chat: ChatId, path: &Path, caption: Option<&str>) -> AppResult<MessageId> {
        let msg = RetryPolicy::default()
            .run("send_video", || async move {
                let mut request = self
                    .send_video(chat, InputFile::file(path.to_path_buf()))
                    .supports_streaming(true);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await
            })
            .await?;
        Ok(msg.id)
    }

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> AppResult<()> {
        RetryPolicy::default()
            .run("edit_message_text", || async move {
                self.edit_message_text(chat, message, text).await
            })
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> AppResult<()> {
        RetryPolicy::default()
            .run("delete_message", || async move {
                Requester::delete_message(self, chat, message).await
            })
            .await?;
        Ok(())
    }

    async fn send_chat_action(&self, chat: ChatId, action: ChatAction) -> AppResult<()> {
        Requester::send_chat_action(self, chat, action).await?;
        Ok(())
    }
}
