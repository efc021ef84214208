//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;
pub mod router;
pub mod sink;
pub mod status;
pub mod types;

/// Bot type used throughout the crate
pub type Bot = teloxide::Bot;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{handle_incoming, schema, HandlerDeps, HandlerError, PollingErrorHandler};
pub use router::{classify, Route, SourceKind, VideoRequest};
pub use sink::{ChatSink, TextFormat};
pub use status::{Stage, StatusMessenger, StatusState};
pub use types::IncomingMessage;
