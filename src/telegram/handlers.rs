//! Telegram bot handler tree configuration
//!
//! Every text message, new or edited, goes through [`handle_incoming`]: the
//! router picks a route, the matching pipeline runs, and any failure is turned
//! into a reply to the same chat. The dispatcher schema is a thin adapter
//! around it so tests can drive the same code with a fake [`ChatSink`].

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::error_handlers::ErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, Message};
use teloxide::RequestError;
use tokio_util::sync::CancellationToken;

use crate::core::config;
use crate::core::joke::JokeClient;
use crate::core::retry::{RetryPolicy, Retryable};
use crate::download::error::VideoError;
use crate::download::pipeline::VideoPipeline;
use crate::telegram::router::{classify, Route, SourceKind, VideoRequest, USAGE};
use crate::telegram::sink::{ChatSink, TextFormat};
use crate::telegram::types::IncomingMessage;
use crate::telegram::Bot;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

const PHOTO_CAPTION: &str = "MAUU";
const PHOTO_UNAVAILABLE: &str = "😿 The photo is hiding right now.";
const JOKE_UNAVAILABLE: &str = "😿 Chuck Norris is busy, try again later.";

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub pipeline: Arc<VideoPipeline>,
    pub jokes: JokeClient,
    /// Root token; every request runs under a child of it
    pub shutdown: CancellationToken,
}

impl HandlerDeps {
    pub fn new(pipeline: Arc<VideoPipeline>, jokes: JokeClient, shutdown: CancellationToken) -> Self {
        Self {
            pipeline,
            jokes,
            shutdown,
        }
    }
}

/// Handles one inbound text message end to end.
///
/// Never fails: pipeline errors become replies, reply errors become log lines.
pub async fn handle_incoming(deps: &HandlerDeps, sink: Arc<dyn ChatSink>, msg: IncomingMessage) {
    let route = classify(&msg.text);
    log::info!("Chat {} message {}: {:?}", msg.chat_id, msg.message_id.0, route);
    let cancel = deps.shutdown.child_token();

    let result = match route {
        Route::Video(VideoRequest {
            kind: SourceKind::TikTok,
            url,
        }) => deps
            .pipeline
            .deliver_lookup(sink.as_ref(), msg.chat_id, &url, &cancel)
            .await
            .map(|_| ()),
        Route::Video(VideoRequest {
            kind: SourceKind::Reddit,
            url,
        }) => deps
            .pipeline
            .deliver_download(Arc::clone(&sink), &msg, &url, &cancel)
            .await
            .map(|_| ()),
        Route::InvalidUrl(kind) => {
            let err = invalid_url(kind, &msg.text);
            log::info!("Chat {} rejected [{}]: {}", msg.chat_id, err.subcategory(), err);
            reply(sink.as_ref(), msg.chat_id, &kind.usage(), TextFormat::MarkdownV2).await;
            Ok(())
        }
        Route::Photo => {
            send_photo(deps, sink.as_ref(), msg.chat_id).await;
            Ok(())
        }
        Route::Joke => {
            send_joke(deps, sink.as_ref(), msg.chat_id, &cancel).await;
            Ok(())
        }
        Route::Usage => {
            reply(sink.as_ref(), msg.chat_id, USAGE, TextFormat::MarkdownV2).await;
            Ok(())
        }
    };

    if let Err(e) = result {
        report_failure(sink.as_ref(), msg.chat_id, &e).await;
    }
}

/// Rejection for a command whose argument is not a link of its source.
fn invalid_url(kind: SourceKind, text: &str) -> VideoError {
    let argument = text.split_whitespace().nth(1).unwrap_or("<missing>");
    VideoError::InvalidUrl(format!("{} expects {}..., got {}", kind.command(), kind.prefix(), argument))
}

async fn reply(sink: &dyn ChatSink, chat: ChatId, text: &str, format: TextFormat) {
    if let Err(e) = sink.send_text(chat, text, format).await {
        log::error!("Failed to reply to chat {}: {}", chat, e);
    }
}

/// Turns a pipeline failure into a reply. Cancellation is silent.
pub async fn report_failure(sink: &dyn ChatSink, chat: ChatId, err: &VideoError) {
    if *err == VideoError::Cancelled {
        log::info!("Request in chat {} cancelled", chat);
        return;
    }
    log::warn!("Request in chat {} failed [{}]: {}", chat, err.subcategory(), err);
    reply(sink, chat, err.user_message(), TextFormat::Plain).await;
}

async fn send_photo(deps: &HandlerDeps, sink: &dyn ChatSink, chat: ChatId) {
    if let Err(e) = sink.send_chat_action(chat, ChatAction::UploadPhoto).await {
        log::debug!("Chat action failed for chat {}: {}", chat, e);
    }
    let path = &deps.pipeline.settings().photo_path;
    if let Err(e) = sink.send_photo(chat, path, PHOTO_CAPTION).await {
        log::error!("Failed to send {} to chat {}: {}", path.display(), chat, e);
        reply(sink, chat, PHOTO_UNAVAILABLE, TextFormat::Plain).await;
    }
}

async fn send_joke(deps: &HandlerDeps, sink: &dyn ChatSink, chat: ChatId, cancel: &CancellationToken) {
    match deps.jokes.random(cancel).await {
        Ok(joke) => reply(sink, chat, &joke, TextFormat::Plain).await,
        Err(e) if e.is_cancelled() => log::info!("Joke request in chat {} cancelled", chat),
        Err(e) => {
            log::warn!("Joke fetch failed: {}", e);
            reply(sink, chat, JOKE_UNAVAILABLE, TextFormat::Plain).await;
        }
    }
}

async fn on_message(deps: HandlerDeps, bot: Bot, msg: Message) -> Result<(), HandlerError> {
    match IncomingMessage::from_message(&msg) {
        Some(incoming) => handle_incoming(&deps, Arc::new(bot), incoming).await,
        None => log::debug!("Ignoring non-text message {} in chat {}", msg.id.0, msg.chat.id),
    }
    Ok(())
}

/// Creates the dispatcher schema. Edited messages are routed like new ones.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_edited = deps.clone();

    dptree::entry()
        .branch(Update::filter_message().endpoint(move |bot: Bot, msg: Message| on_message(deps.clone(), bot, msg)))
        .branch(
            Update::filter_edited_message()
                .endpoint(move |bot: Bot, msg: Message| on_message(deps_edited.clone(), bot, msg)),
        )
}

/// Logs update listener errors and cools down after network-class failures.
pub struct PollingErrorHandler {
    cooldown: Duration,
}

impl PollingErrorHandler {
    pub fn new() -> Arc<Self> {
        Self::with_cooldown(config::retry::transport_backoff())
    }

    pub fn with_cooldown(cooldown: Duration) -> Arc<Self> {
        Arc::new(Self { cooldown })
    }
}

impl ErrorHandler<RequestError> for PollingErrorHandler {
    fn handle_error(self: Arc<Self>, error: RequestError) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            match &error {
                RequestError::Api(api) => log::error!("Telegram API error: {}", api),
                other => log::error!("An error from the update listener: {}", other),
            }
            if error.is_retryable() {
                let pause = RetryPolicy::new().backoff(self.cooldown).delay_for(&error);
                tokio::time::sleep(pause).await;
            }
        })
    }
}
