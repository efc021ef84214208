//! Recording chat sink
//!
//! Stands in for the Telegram bot in integration tests: every outbound call is
//! appended to an ordered log, uploaded files are read at send time so tests
//! can check exactly which bytes reached which chat.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;
use teloxide::types::{ChatAction, ChatId, MessageId};

use mauloader::core::error::{AppError, AppResult};
use mauloader::telegram::sink::{ChatSink, TextFormat};

/// One outbound call as seen by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Text {
        chat: ChatId,
        id: MessageId,
        text: String,
        format: TextFormat,
    },
    Photo {
        chat: ChatId,
        path: PathBuf,
        caption: String,
    },
    VideoUrl {
        chat: ChatId,
        url: String,
        caption: String,
    },
    VideoFile {
        chat: ChatId,
        bytes: Vec<u8>,
    },
    Edit {
        chat: ChatId,
        id: MessageId,
        text: String,
    },
    Delete {
        chat: ChatId,
        id: MessageId,
    },
    Action {
        chat: ChatId,
    },
}

impl SinkCall {
    pub fn chat(&self) -> ChatId {
        match self {
            SinkCall::Text { chat, .. }
            | SinkCall::Photo { chat, .. }
            | SinkCall::VideoUrl { chat, .. }
            | SinkCall::VideoFile { chat, .. }
            | SinkCall::Edit { chat, .. }
            | SinkCall::Delete { chat, .. }
            | SinkCall::Action { chat } => *chat,
        }
    }

    /// Compact form for sequence assertions, e.g. `post:Downloading…`.
    pub fn label(&self) -> String {
        match self {
            SinkCall::Text { text, .. } => format!("text:{}", text),
            SinkCall::Photo { caption, .. } => format!("photo:{}", caption),
            SinkCall::VideoUrl { url, .. } => format!("video_url:{}", url),
            SinkCall::VideoFile { bytes, .. } => format!("video_file:{}", String::from_utf8_lossy(bytes)),
            SinkCall::Edit { text, .. } => format!("edit:{}", text),
            SinkCall::Delete { .. } => "delete".to_string(),
            SinkCall::Action { .. } => "action".to_string(),
        }
    }
}

fn refused(what: &str) -> AppError {
    AppError::Io(std::io::Error::other(format!("{} refused by test sink", what)))
}

#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    next_id: AtomicI32,
    pub fail_video: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_photo: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, chat: ChatId) -> Vec<SinkCall> {
        self.calls().into_iter().filter(|c| c.chat() == chat).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls().iter().map(SinkCall::label).collect()
    }

    pub fn labels_for(&self, chat: ChatId) -> Vec<String> {
        self.calls_for(chat).iter().map(SinkCall::label).collect()
    }

    fn record(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn allocate_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn send_text(&self, chat: ChatId, text: &str, format: TextFormat) -> AppResult<MessageId> {
        let id = self.allocate_id();
        self.record(SinkCall::Text {
            chat,
            id,
            text: text.to_string(),
            format,
        });
        Ok(id)
    }

    async fn send_photo(&self, chat: ChatId, path: &Path, caption: &str) -> AppResult<MessageId> {
        if self.fail_photo.load(Ordering::SeqCst) {
            return Err(refused("photo"));
        }
        self.record(SinkCall::Photo {
            chat,
            path: path.to_path_buf(),
            caption: caption.to_string(),
        });
        Ok(self.allocate_id())
    }

    async fn send_video_url(&self, chat: ChatId, url: &str, caption: &str) -> AppResult<MessageId> {
        if self.fail_video.load(Ordering::SeqCst) {
            return Err(refused("video"));
        }
        self.record(SinkCall::VideoUrl {
            chat,
            url: url.to_string(),
            caption: caption.to_string(),
        });
        Ok(self.allocate_id())
    }

    async fn send_video_file(&self, chat: ChatId, path: &Path, _caption: Option<&str>) -> AppResult<MessageId> {
        if self.fail_video.load(Ordering::SeqCst) {
            return Err(refused("video"));
        }
        let bytes = tokio::fs::read(path).await?;
        self.record(SinkCall::VideoFile { chat, bytes });
        Ok(self.allocate_id())
    }

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> AppResult<()> {
        self.record(SinkCall::Edit {
            chat,
            id: message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> AppResult<()> {
        self.record(SinkCall::Delete { chat, id: message });
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(refused("delete"));
        }
        Ok(())
    }

    async fn send_chat_action(&self, chat: ChatId, _action: ChatAction) -> AppResult<()> {
        self.record(SinkCall::Action { chat });
        Ok(())
    }
}
