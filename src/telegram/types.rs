use teloxide::types::{ChatId, Message, MessageId};

/// The part of an inbound chat message the pipelines read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
}

impl IncomingMessage {
    pub fn new(chat_id: ChatId, message_id: MessageId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: text.into(),
        }
    }

    /// Extracts the text message; non-text messages yield `None`.
    pub fn from_message(msg: &Message) -> Option<Self> {
        msg.text().map(|text| Self::new(msg.chat.id, msg.id, text))
    }

    /// Short tag naming this message in job directories and logs.
    pub fn tag(&self) -> String {
        format!("{}-{}", self.chat_id.0, self.message_id.0)
    }
}
